use std::io::BufRead;

fn main() {
    let mut name = String::new();
    std::io::stdin().lock().read_line(&mut name).unwrap();
    println!("Hello, {}!", name.trim());
}
