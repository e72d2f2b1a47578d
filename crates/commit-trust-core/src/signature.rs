//! Detached signature envelope parsing.
//!
//! A commit signature is an ASCII-armored OpenPGP signature holding exactly
//! one signature packet. Anything after that packet is rejected rather than
//! ignored.

use std::io::Read;

use sequoia_openpgp as openpgp;

use openpgp::armor::{self, ReaderMode};
use openpgp::packet::Signature;
use openpgp::parse::{PacketParser, PacketParserResult, Parse};
use openpgp::{KeyID, Packet};

use crate::error::SignatureParseError;

const ARMOR_HEADER: &str = "-----BEGIN PGP SIGNATURE-----";

/// A parsed signature blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    /// Issuer key id, 16 uppercase hex characters.
    pub issuer_key_id: String,

    /// The original armored bytes, kept for verification.
    pub raw: Vec<u8>,
}

impl SignatureEnvelope {
    /// Parse an armored detached signature.
    pub fn parse(armored: &[u8]) -> Result<Self, SignatureParseError> {
        let signature = parse_single_signature(armored)?;
        let issuer = issuer_key_id(&signature).ok_or(SignatureParseError::MissingIssuerKeyId)?;

        Ok(Self {
            issuer_key_id: issuer,
            raw: armored.to_vec(),
        })
    }
}

/// Format a 64-bit key id as 16 uppercase hex characters.
///
/// Returns `None` for key ids that are not 8 bytes long.
pub fn format_key_id(key_id: &KeyID) -> Option<String> {
    let bytes: [u8; 8] = key_id.as_bytes().try_into().ok()?;
    Some(format!("{:016X}", u64::from_be_bytes(bytes)))
}

/// Only the Issuer subpacket counts. An Issuer Fingerprint alone is rejected.
fn issuer_key_id(signature: &Signature) -> Option<String> {
    signature.issuers().find_map(format_key_id)
}

fn dearmor(armored: &[u8]) -> Result<Vec<u8>, SignatureParseError> {
    let text = std::str::from_utf8(armored)
        .map_err(|e| SignatureParseError::Armor(format!("not valid UTF-8: {}", e)))?;
    if !text.trim_start().starts_with(ARMOR_HEADER) {
        return Err(SignatureParseError::Armor(
            "missing signature armor header".to_string(),
        ));
    }

    let mut reader = armor::Reader::from_bytes(
        armored,
        ReaderMode::Tolerant(Some(armor::Kind::Signature)),
    );
    let mut body = Vec::new();
    reader
        .read_to_end(&mut body)
        .map_err(|e| SignatureParseError::Armor(e.to_string()))?;

    if body.is_empty() {
        return Err(SignatureParseError::Armor("empty armor body".to_string()));
    }
    Ok(body)
}

fn parse_single_signature(armored: &[u8]) -> Result<Signature, SignatureParseError> {
    let body = dearmor(armored)?;

    let ppr = PacketParser::from_bytes(&body)
        .map_err(|e| SignatureParseError::Packet(e.to_string()))?;
    let (packet, rest) = match ppr {
        PacketParserResult::Some(pp) => pp
            .next()
            .map_err(|e| SignatureParseError::Packet(e.to_string()))?,
        PacketParserResult::EOF(_) => {
            return Err(SignatureParseError::Packet("no packets found".to_string()))
        }
    };

    // A second read must hit the end of input.
    if let PacketParserResult::Some(_) = rest {
        return Err(SignatureParseError::UnexpectedPackets);
    }

    match packet {
        Packet::Signature(signature) => Ok(signature),
        _ => Err(SignatureParseError::NotASignature),
    }
}
