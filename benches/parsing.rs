use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use mailrender::config::{DecoderConfig, OutputConfig};

fn read_fixture(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

fn bench_parse_message(c: &mut Criterion) {
    let config = DecoderConfig::default();

    for name in ["simple.eml", "nested.eml", "quoted_printable.eml"] {
        let raw = read_fixture(name);
        c.bench_function(&format!("parse_{name}"), |b| {
            b.iter(|| mailrender::parser::eml::parse_message(&raw, &config).unwrap())
        });
    }
}

fn bench_large_attachment(c: &mut Criterion) {
    use base64::Engine;

    let payload: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&payload);
    let mut raw = String::from(
        "Subject: big\r\nContent-Type: multipart/mixed; boundary=b\r\n\r\n--b\r\n\
         Content-Type: application/octet-stream\r\n\
         Content-Disposition: attachment; filename=big.bin\r\n\
         Content-Transfer-Encoding: base64\r\n\r\n",
    );
    for line in encoded.as_bytes().chunks(76) {
        raw.push_str(&String::from_utf8_lossy(line));
        raw.push_str("\r\n");
    }
    raw.push_str("--b--\r\n");

    let config = DecoderConfig::default();
    c.bench_function("parse_1mb_base64_attachment", |b| {
        b.iter(|| mailrender::parser::eml::parse_message(raw.as_bytes(), &config).unwrap())
    });
}

fn bench_write_output(c: &mut Criterion) {
    let record =
        mailrender::parser::eml::parse_message(&read_fixture("nested.eml"), &DecoderConfig::default())
            .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    c.bench_function("write_output_nested", |b| {
        b.iter(|| mailrender::export::writer::write_output(&record, &out, &OutputConfig::default()).unwrap())
    });
}

criterion_group!(benches, bench_parse_message, bench_large_attachment, bench_write_output);
criterion_main!(benches);
