//! OpenPGP fixtures for unit tests.

use std::io::Write;
use std::time::{Duration, SystemTime};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sequoia_openpgp as openpgp;

use openpgp::cert::prelude::*;
use openpgp::packet::signature::subpacket::SubpacketTag;
use openpgp::packet::Signature;
use openpgp::parse::Parse;
use openpgp::policy::StandardPolicy;
use openpgp::serialize::stream::{Armorer, Message, Signer};
use openpgp::serialize::{Serialize, SerializeInto};
use openpgp::{Packet, PacketPile};

use crate::signature::format_key_id;

pub(crate) fn generate_cert(user_id: &str) -> Cert {
    let (cert, _revocation) = CertBuilder::general_purpose(None, Some(user_id))
        .set_creation_time(SystemTime::now() - Duration::from_secs(3600))
        .generate()
        .unwrap();
    cert
}

pub(crate) fn armored_public_key(cert: &Cert) -> String {
    String::from_utf8(cert.armored().to_vec().unwrap()).unwrap()
}

pub(crate) fn base64_public_key(cert: &Cert) -> String {
    BASE64.encode(cert.to_vec().unwrap())
}

/// Key id of the subkey that [`sign_detached`] signs with.
pub(crate) fn signing_key_id(cert: &Cert) -> String {
    let policy = StandardPolicy::new();
    let key = cert
        .keys()
        .with_policy(&policy, None)
        .supported()
        .alive()
        .revoked(false)
        .for_signing()
        .next()
        .unwrap();
    format_key_id(&key.keyid()).unwrap()
}

pub(crate) fn sign_detached(cert: &Cert, payload: &[u8]) -> String {
    let policy = StandardPolicy::new();
    let keypair = cert
        .keys()
        .unencrypted_secret()
        .with_policy(&policy, None)
        .supported()
        .alive()
        .revoked(false)
        .for_signing()
        .next()
        .unwrap()
        .key()
        .clone()
        .into_keypair()
        .unwrap();

    let mut sink = Vec::new();
    {
        let message = Message::new(&mut sink);
        let message = Armorer::new(message)
            .kind(openpgp::armor::Kind::Signature)
            .build()
            .unwrap();
        let mut signer = Signer::new(message, keypair).detached().build().unwrap();
        signer.write_all(payload).unwrap();
        signer.finalize().unwrap();
    }
    String::from_utf8(sink).unwrap()
}

pub(crate) fn signature_packet(armored: &str) -> Signature {
    let pile = PacketPile::from_bytes(armored.as_bytes()).unwrap();
    match pile.into_children().next() {
        Some(Packet::Signature(sig)) => sig,
        other => panic!("expected a signature packet, got {:?}", other),
    }
}

pub(crate) fn armor_packets(packets: &[Packet]) -> String {
    let mut sink = Vec::new();
    {
        let mut writer =
            openpgp::armor::Writer::new(&mut sink, openpgp::armor::Kind::Signature).unwrap();
        for packet in packets {
            packet.serialize(&mut writer).unwrap();
        }
        writer.finalize().unwrap();
    }
    String::from_utf8(sink).unwrap()
}

pub(crate) fn without_subpackets(mut sig: Signature, tags: &[SubpacketTag]) -> Signature {
    for &tag in tags {
        sig.hashed_area_mut().remove_all(tag);
        sig.unhashed_area_mut().remove_all(tag);
    }
    sig
}
