#![feature(test)]
extern crate test;

use rawstream::{ScanOptions, scan};

fn sample(objects: usize) -> Vec<u8> {
    let mut buffer = b"%PDF-1.7\n".to_vec();
    for id in 1..=objects {
        let payload = format!("q {} 0 0 {} 0 0 cm /Im{} Do Q", id, id, id);
        buffer.extend_from_slice(
            format!(
                "{} 0 obj\n<</Type/XObject/DecodeParms <</K -1/Columns {}>>/Length {}>>\nstream\n{}\nendstream\nendobj\n",
                id,
                id,
                payload.len(),
                payload
            )
            .as_bytes(),
        );
    }
    buffer
}

#[bench]
fn bench_scan(b: &mut test::Bencher) {
    let buffer = sample(1000);
    let options = ScanOptions::default();

    b.iter(|| {
        assert_eq!(scan(&buffer, &options).recovered_count(), 1000);
    })
}

#[bench]
fn bench_scan_corrupt(b: &mut test::Bencher) {
    let mut buffer = vec![b' '; 64 * 1024];
    for position in (0..buffer.len() - 8).step_by(512) {
        buffer[position + 1..position + 7].copy_from_slice(b"stream");
    }
    let options = ScanOptions::default();

    b.iter(|| scan(&buffer, &options).failed_count())
}
