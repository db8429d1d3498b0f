// Touch every page so the allocation is backed by physical memory and
// shows up in RSS.
fn main() {
    let size = 50 * 1024 * 1024;
    let mut v = vec![0u8; size];
    for chunk in v.chunks_mut(4096) {
        chunk[0] = 0x5A;
    }
    println!("allocated {} bytes", v.len());
    std::thread::sleep(std::time::Duration::from_secs(5));
}
