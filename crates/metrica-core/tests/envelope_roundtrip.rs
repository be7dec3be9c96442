#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metrica_core::protocol::crypto::{Decryptor, Encryptor};
use metrica_core::protocol::envelope::{EnvelopeDecoder, EnvelopeEncoder, EnvelopeHeaders};
use metrica_core::protocol::record::{decode_records, encode_records};
use metrica_core::protocol::sign::Signer;
use metrica_core::protocol::CONTENT_ENCODING_GZIP;
use metrica_core::{Kind, Metric, MetricaError, Value};

use vector_loader::fixture;

fn sample() -> Vec<Metric> {
    vec![
        Metric::gauge("Alloc", 1024.25).unwrap(),
        Metric::counter("PollCount", 5).unwrap(),
        Metric::gauge("RandomValue", -0.5).unwrap(),
        Metric::counter("Requests", -2).unwrap(),
    ]
}

fn triples(ms: &[Metric]) -> Vec<(String, Kind, String)> {
    let mut v: Vec<_> = ms
        .iter()
        .map(|m| (m.name().to_string(), m.kind(), m.value().to_string()))
        .collect();
    v.sort();
    v
}

fn gzip_headers(signature: Option<&str>) -> EnvelopeHeaders<'_> {
    EnvelopeHeaders {
        content_encoding: Some(CONTENT_ENCODING_GZIP),
        signature,
    }
}

#[test]
fn records_omit_the_other_field() {
    let json = encode_records(&sample()).unwrap();
    let v: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(v[0]["type"], "gauge");
    assert!(v[0].get("delta").is_none());
    assert_eq!(v[1]["type"], "counter");
    assert!(v[1].get("value").is_none());
    assert_eq!(v[1]["delta"], 5);

    let back = decode_records(&json).unwrap();
    assert_eq!(back, sample());
}

#[test]
fn round_trip_plain() {
    let enc = EnvelopeEncoder::default();
    let env = enc.encode_batch(&sample()).unwrap().expect("non-empty batch");
    assert!(env.signature.is_none());
    // gzip magic
    assert_eq!(&env.body[..2], &[0x1f, 0x8b]);

    let mut reversed = sample();
    reversed.reverse();

    let dec = EnvelopeDecoder::default();
    let got = dec.decode_batch(&env.body, &gzip_headers(None)).unwrap();
    assert_eq!(triples(&got), triples(&reversed));
}

#[test]
fn empty_batch_sends_nothing() {
    let enc = EnvelopeEncoder::new(Some(Signer::new("k")), None);
    assert!(enc.encode_batch(&[]).unwrap().is_none());
}

#[test]
fn signature_covers_compressed_body() {
    let signer = Signer::new("s3cr3t");
    let enc = EnvelopeEncoder::new(Some(signer.clone()), None);
    let env = enc.encode_batch(&sample()).unwrap().unwrap();
    let sig = env.signature.clone().expect("signed");
    assert_eq!(sig, signer.sign(&env.body).unwrap());

    let dec = EnvelopeDecoder::new(Some(signer), None);
    let got = dec.decode_batch(&env.body, &gzip_headers(Some(&sig))).unwrap();
    assert_eq!(triples(&got), triples(&sample()));
}

#[test]
fn flipping_any_byte_is_bad_data_hash() {
    let signer = Signer::new("s3cr3t");
    let enc = EnvelopeEncoder::new(Some(signer.clone()), None);
    let env = enc.encode_batch(&sample()).unwrap().unwrap();
    let sig = env.signature.clone().unwrap();
    let dec = EnvelopeDecoder::new(Some(signer), None);

    for i in 0..env.body.len() {
        let mut body = env.body.to_vec();
        body[i] ^= 0x80;
        let err = dec
            .decode_batch(&body, &gzip_headers(Some(&sig)))
            .expect_err("tampered body must be rejected");
        assert!(matches!(err, MetricaError::BadDataHash), "byte {i}: {err}");
    }
}

#[test]
fn single_record_envelope() {
    let enc = EnvelopeEncoder::default();
    let m = Metric::counter("PollCount", 9).unwrap();
    let env = enc.encode_one(&m).unwrap();
    let got = EnvelopeDecoder::default()
        .decode_one(&env.body, &gzip_headers(None))
        .unwrap();
    assert_eq!(got, m);
}

#[test]
fn rsa_round_trip_spans_blocks() {
    let enc_key = Encryptor::from_pem(&fixture("rsa_public.pem")).unwrap();
    let dec_key = Decryptor::from_pem(&fixture("rsa_private.pem")).unwrap();

    // 2048-bit key: 126-byte plaintext blocks, 256-byte ciphertext blocks
    let plain: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
    let cipher = enc_key.encrypt(&plain).unwrap();
    assert_eq!(cipher.len(), plain.len().div_ceil(126) * 256);
    assert_eq!(dec_key.decrypt(&cipher).unwrap(), plain);

    let err = dec_key.decrypt(&cipher[..cipher.len() - 1]).expect_err("bad framing");
    assert!(matches!(err, MetricaError::BadRequest(_)));
}

#[test]
fn signed_and_encrypted_envelope() {
    let signer = Signer::new("s3cr3t");
    let enc = EnvelopeEncoder::new(
        Some(signer.clone()),
        Some(Encryptor::from_pem(&fixture("rsa_public.pem")).unwrap()),
    );
    let dec = EnvelopeDecoder::new(
        Some(signer),
        Some(Decryptor::from_pem(&fixture("rsa_private.pem")).unwrap()),
    );

    let env = enc.encode_batch(&sample()).unwrap().unwrap();
    let sig = env.signature.clone().unwrap();
    let got = dec.decode_batch(&env.body, &gzip_headers(Some(&sig))).unwrap();
    assert_eq!(triples(&got), triples(&sample()));

    let other = EnvelopeDecoder::new(
        Some(Signer::new("wrong")),
        Some(Decryptor::from_pem(&fixture("rsa_private.pem")).unwrap()),
    );
    let err = other
        .decode_batch(&env.body, &gzip_headers(Some(&sig)))
        .expect_err("wrong secret");
    assert!(matches!(err, MetricaError::BadDataHash));
}

#[test]
fn unreadable_key_is_config_error() {
    let err = Encryptor::from_file("tests/vectors/does_not_exist.pem").expect_err("must fail");
    assert!(matches!(err, MetricaError::Config(_)));
    let err = Decryptor::from_pem("not a key").expect_err("must fail");
    assert!(matches!(err, MetricaError::Config(_)));
}

#[test]
fn gauge_counter_values_survive() {
    let ms = vec![Metric::new("x", Kind::Gauge, Value::Gauge(0.1 + 0.2)).unwrap()];
    let json = encode_records(&ms).unwrap();
    assert_eq!(decode_records(&json).unwrap(), ms);
}
