fn main() {
    println!("going to sleep");
    std::thread::sleep(std::time::Duration::from_secs(10));
    println!("woke up");
}
