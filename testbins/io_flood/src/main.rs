use std::io::{Read, Write};

// Writes a large burst to stdout before reading anything, then consumes all
// of stdin. Deadlocks against a supervisor that pumps the pipes serially.
fn main() {
    let chunk = vec![b'x'; 64 * 1024];
    let mut stdout = std::io::stdout().lock();
    for _ in 0..32 {
        stdout.write_all(&chunk).unwrap();
    }
    stdout.flush().unwrap();

    let mut total = 0usize;
    let mut buf = vec![0u8; 64 * 1024];
    let mut stdin = std::io::stdin().lock();
    loop {
        match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(_) => break,
        }
    }
    println!("\nconsumed {total} bytes");
}
