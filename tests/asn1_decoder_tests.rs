//! Decoder behaviour on real-world encodings: OpenSSL certificates, BER
//! indefinite lengths and malformed input.

mod common;

use authenticode_verifier::domain::asn1::{
    Asn1Error, ByteWindow, Constructed, Element, ElementTree, Integer, ObjectIdentifier, Tag,
};
use authenticode_verifier::domain::constants::oid_name;
use authenticode_verifier::domain::pkcs7::Certificate;
use common::{context, octets, oid, seq, set, small_integer, TestSigner};

#[test]
fn test_decode_openssl_certificate() {
    let signer = TestSigner::p256("Decoder Test", 0x77);
    let der = signer.certificate_der();

    let element = Element::from_der(der.clone()).unwrap();
    assert_eq!(element.tag(), Tag::SEQUENCE);
    assert_eq!(element.element_data().len(), der.len());

    let certificate = Certificate::from_der(der.clone()).unwrap();
    assert_eq!(certificate.der(), der.as_slice());
    assert_eq!(certificate.serial_number().value(), &num_bigint::BigInt::from(0x77));
    assert_eq!(certificate.subject(), certificate.issuer());
    assert!(certificate.subject().to_string().contains("CN=Decoder Test"));
    assert!(certificate.not_before() < certificate.not_after());
}

#[test]
fn test_children_share_the_input_buffer() {
    let der = seq(&[small_integer(5), octets(b"payload")]);
    let element = Element::from_der(der).unwrap();
    let sequence = element.cast::<Constructed>().unwrap();

    let payload = sequence.get(1).unwrap();
    assert_eq!(payload.content_data().as_slice(), b"payload");
    assert!(std::sync::Arc::ptr_eq(
        payload.content_data().buffer(),
        element.element_data().buffer()
    ));
    assert_eq!(payload.element_data().offset(), 5);
}

#[test]
fn test_indefinite_length_ber() {
    // SEQUENCE (indefinite) { INTEGER 1, SET (indefinite) { NULL } } INTEGER 2
    let bytes = vec![
        0x30, 0x80, 0x02, 0x01, 0x01, 0x31, 0x80, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x01,
        0x02,
    ];
    let window = ByteWindow::from(bytes);
    let element = Element::decode(&window).unwrap();
    let sequence = element.cast::<Constructed>().unwrap();
    assert_eq!(sequence.len(), 2);
    assert_eq!(element.element_data().len(), 13);
    assert!(sequence.get(1).unwrap().cast::<Constructed>().unwrap().is_set());

    let trailing = window.advance(element.element_data().len()).unwrap();
    let next = Element::decode(&trailing).unwrap();
    assert_eq!(next.cast::<Integer>().unwrap().value(), &num_bigint::BigInt::from(2));
}

#[test]
fn test_implicit_context_reinterpretation() {
    // [0] IMPLICIT SET { OID } as found in signed attributes
    let encoded = context(0, &[oid("1.2.840.113549.1.9.3")]);
    let element = Element::from_der(encoded.clone()).unwrap();
    assert!(element.tag().is_context(0));

    let as_set = element
        .cast::<Constructed>()
        .unwrap()
        .reinterpret_as_set()
        .unwrap();
    let mut expected = encoded;
    expected[0] = 0x31;
    assert_eq!(as_set.element_data().as_slice(), expected.as_slice());
    assert_eq!(
        as_set.get(0).unwrap().cast::<ObjectIdentifier>().unwrap().dotted(),
        "1.2.840.113549.1.9.3"
    );
}

#[test]
fn test_dump_names_known_oids() {
    let der = seq(&[oid("2.16.840.1.101.3.4.2.1"), set(&[])]);
    let element = Element::from_der(der).unwrap();
    let text = ElementTree::new(&element).with_oid_names(oid_name).to_string();
    assert_eq!(
        text,
        "SEQUENCE (2 children)\n  OBJECT IDENTIFIER 2.16.840.1.101.3.4.2.1 (sha256)\n  SET (0 children)\n"
    );
}

#[test]
fn test_malformed_input_is_rejected() {
    // Truncated content.
    assert!(Element::from_der(vec![0x04, 0x05, 0x01]).is_err());
    // Indefinite length on a primitive.
    assert!(matches!(
        Element::from_der(vec![0x04, 0x80, 0x00, 0x00]),
        Err(Asn1Error::IndefiniteLength(_))
    ));
    // Unterminated indefinite sequence.
    assert!(Element::from_der(vec![0x30, 0x80, 0x05, 0x00]).is_err());
    // Empty input.
    assert!(Element::from_der(Vec::new()).is_err());
}
