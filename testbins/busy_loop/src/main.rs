use std::time::{Duration, Instant};

// Two spinning threads keep CPU usage well above one core until the
// deadline, so a sampling supervisor has time to react.
fn main() {
    let deadline = Instant::now() + Duration::from_secs(30);
    let handles: Vec<_> = (0..2)
        .map(|_| {
            std::thread::spawn(move || {
                let mut x = 1u64;
                while Instant::now() < deadline {
                    x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
                    std::hint::black_box(x);
                }
                x
            })
        })
        .collect();
    for handle in handles {
        let _ = handle.join();
    }
}
