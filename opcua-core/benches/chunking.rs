//! Criterion benchmark for the Chunk Manager's hot path (SPEC_FULL §E),
//! matching the teacher's `harness = false` convention for its own
//! perf benches.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::RngCore;

use opcua_core::chunk::receive::decode_chunk;
use opcua_core::chunk::send::encode_chunk;
use opcua_core::chunk::SecurityHeader;
use opcua_core::codec::{MessageKind, SequenceHeader};
use opcua_core::collaborators::crypto::NullCryptoProvider;

fn random_body(len: usize) -> Vec<u8> {
    let mut body = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut body);
    body
}

fn bench_encode_decode(c: &mut Criterion) {
    let body = random_body(4096);
    let security_header = SecurityHeader::Symmetric { token_id: 1 };

    c.bench_function("encode_chunk_4kb", |b| {
        b.iter(|| {
            let seq = SequenceHeader { sequence_number: 1, request_id: 1 };
            let encoded = encode_chunk(
                MessageKind::Msg,
                &security_header,
                seq,
                black_box(&body),
                &NullCryptoProvider,
                65536,
                false,
            )
            .unwrap();
            black_box(encoded);
        })
    });

    let seq = SequenceHeader { sequence_number: 1, request_id: 1 };
    let encoded = encode_chunk(
        MessageKind::Msg,
        &security_header,
        seq,
        &body,
        &NullCryptoProvider,
        65536,
        false,
    )
    .unwrap();

    c.bench_function("decode_chunk_4kb", |b| {
        b.iter(|| {
            let decoded = decode_chunk(black_box(&encoded), &NullCryptoProvider, |id| id == 1).unwrap();
            black_box(decoded);
        })
    });
}

criterion_group!(benches, bench_encode_decode);
criterion_main!(benches);
