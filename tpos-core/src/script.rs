//! # Marker Scripts
//!
//! Building, classifying and disassembling the `OP_RETURN` marker that carries
//! a contract's metadata.
//!
//! The marker is read back through its textual disassembly, rendered the way
//! node software prints scripts: small pushes become decimal numbers, larger
//! pushes become hex and small-integer opcodes become bare digits.
//!
//! ```text
//! OP_RETURN 90 9b1c...e4f0 2
//! ```

use bitcoin::{
    hashes::Hash,
    opcodes::all::{OP_PUSHNUM_1, OP_PUSHNUM_16, OP_PUSHNUM_NEG1, OP_RETURN},
    script::{Builder, Instruction},
    Address, Network, OutPoint, Script, ScriptBuf,
};

use crate::DecodeError;

/// Scripts larger than this can never be spent.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Largest null-data script relayed by default policy.
pub const MAX_OP_RETURN_RELAY: usize = 83;

/// Pushes up to this size render as numbers.
const MAX_NUMERIC_PUSH: usize = 4;

/// Returns true if no input can ever spend an output locked by `script`.
pub fn is_unspendable(script: &Script) -> bool {
    script.is_op_return() || script.len() > MAX_SCRIPT_SIZE
}

/// Returns true if `script` is `OP_RETURN` followed only by data pushes.
pub fn is_null_data(script: &Script) -> bool {
    if !script.is_op_return() {
        return false;
    }

    let mut instructions = script.instructions();
    // Skip OP_RETURN itself.
    instructions.next();

    instructions.all(|instruction| match instruction {
        Ok(Instruction::PushBytes(_)) => true,
        Ok(Instruction::Op(op)) => op.to_u8() <= OP_PUSHNUM_16.to_u8(),
        Err(_) => false,
    })
}

/// Build the marker script for a contract.
///
/// `stored_percent` is written verbatim; which share it represents is
/// decided by the caller's [`CommissionConvention`](crate::CommissionConvention).
/// The merchant txid is pushed in display order so that its disassembly
/// matches the txid string.
pub fn build_marker_script(stored_percent: u8, merchant_outpoint: &OutPoint) -> ScriptBuf {
    let mut txid_bytes = merchant_outpoint.txid.to_byte_array();
    txid_bytes.reverse();

    Builder::new()
        .push_opcode(OP_RETURN)
        .push_int(i64::from(stored_percent))
        .push_slice(txid_bytes)
        .push_int(i64::from(merchant_outpoint.vout))
        .into_script()
}

/// Destination paid by `script`.
///
/// Pay-to-pubkey outputs resolve to the P2PKH address of their key, so a
/// stake paid to a bare key matches the key's address.
pub(crate) fn extract_address(script: &Script, network: Network) -> Option<Address> {
    match script.p2pk_public_key() {
        Some(public_key) => Some(Address::p2pkh(public_key.pubkey_hash(), network)),
        None => Address::from_script(script, network).ok(),
    }
}

/// Render `script` as its whitespace-separated disassembly tokens.
pub fn disassemble(script: &Script) -> Result<Vec<String>, DecodeError> {
    script
        .instructions()
        .map(|instruction| match instruction {
            Ok(Instruction::PushBytes(bytes)) => Ok(render_push(bytes.as_bytes())),
            Ok(Instruction::Op(op)) => Ok(render_opcode(op.to_u8(), &op.to_string())),
            Err(_) => Err(DecodeError::MalformedScript),
        })
        .collect()
}

fn render_push(bytes: &[u8]) -> String {
    if bytes.len() <= MAX_NUMERIC_PUSH {
        read_script_num(bytes).to_string()
    } else {
        hex::encode(bytes)
    }
}

fn render_opcode(code: u8, name: &str) -> String {
    if code == OP_PUSHNUM_NEG1.to_u8() {
        "-1".to_string()
    } else if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&code) {
        (code - OP_PUSHNUM_1.to_u8() + 1).to_string()
    } else {
        name.to_string()
    }
}

/// Little-endian sign-magnitude integer, without the minimal-encoding check.
fn read_script_num(bytes: &[u8]) -> i64 {
    let Some((last, _)) = bytes.split_last() else {
        return 0;
    };

    let mut value = bytes
        .iter()
        .enumerate()
        .fold(0i64, |acc, (i, byte)| acc | (i64::from(*byte) << (8 * i)));

    if last & 0x80 != 0 {
        value &= !(0x80i64 << (8 * (bytes.len() - 1)));
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use bitcoin::Txid;
    use std::str::FromStr;

    #[test]
    fn test_marker_disassembles_to_four_tokens() {
        let outpoint = test_merchant_outpoint(2);
        let script = build_marker_script(90, &outpoint);

        let tokens = disassemble(&script).unwrap();
        assert_eq!(
            tokens,
            vec![
                "OP_RETURN".to_string(),
                "90".to_string(),
                outpoint.txid.to_string(),
                "2".to_string(),
            ]
        );
    }

    #[test]
    fn test_small_integers_render_as_digits() {
        // 10 and 16 are encoded as OP_10 / OP_16, 0 as an empty push.
        let outpoint = OutPoint {
            txid: Txid::from_str(constants::TEST_MERCHANT_TXID).unwrap(),
            vout: 16,
        };
        let tokens = disassemble(&build_marker_script(10, &outpoint)).unwrap();
        assert_eq!(tokens[1], "10");
        assert_eq!(tokens[3], "16");

        let outpoint = OutPoint { vout: 0, ..outpoint };
        let tokens = disassemble(&build_marker_script(10, &outpoint)).unwrap();
        assert_eq!(tokens[3], "0");
    }

    #[test]
    fn test_large_output_index() {
        let outpoint = OutPoint {
            txid: Txid::from_str(constants::TEST_MERCHANT_TXID).unwrap(),
            vout: 70_000,
        };
        let tokens = disassemble(&build_marker_script(50, &outpoint)).unwrap();
        assert_eq!(tokens[3], "70000");
    }

    #[test]
    fn test_read_script_num() {
        assert_eq!(read_script_num(&[]), 0);
        assert_eq!(read_script_num(&[0x5a]), 90);
        assert_eq!(read_script_num(&[0x85]), -5);
        assert_eq!(read_script_num(&[0x80, 0x00]), 128);
        assert_eq!(read_script_num(&[0xff, 0xff, 0xff, 0x7f]), 0x7fff_ffff);
        assert_eq!(read_script_num(&[0xff, 0xff, 0xff, 0xff]), -0x7fff_ffff);
    }

    #[test]
    fn test_truncated_push_is_malformed() {
        // OP_RETURN, then a push announcing 5 bytes with only 2 present.
        let script = ScriptBuf::from_bytes(vec![0x6a, 0x05, 0x01, 0x02]);
        assert_eq!(disassemble(&script), Err(DecodeError::MalformedScript));
        assert!(!is_null_data(&script));
        assert!(is_unspendable(&script));
    }

    #[test]
    fn test_null_data_classification() {
        let marker = build_marker_script(90, &test_merchant_outpoint(0));
        assert!(is_null_data(&marker));
        assert!(is_unspendable(&marker));

        // OP_RETURN OP_DUP is unspendable but not push-only.
        let script = ScriptBuf::from_bytes(vec![0x6a, 0x76]);
        assert!(is_unspendable(&script));
        assert!(!is_null_data(&script));

        let delegate = test_p2pkh_address(1).script_pubkey();
        assert!(!is_unspendable(&delegate));
        assert!(!is_null_data(&delegate));
    }

    #[test]
    fn test_oversized_script_is_unspendable() {
        let script = ScriptBuf::from_bytes(vec![0x51; MAX_SCRIPT_SIZE + 1]);
        assert!(is_unspendable(&script));
        assert!(!is_null_data(&script));
    }

    #[test]
    fn test_extract_address() {
        let key = bitcoin::PublicKey::new(create_test_public_key(4).0);
        let p2pk = ScriptBuf::new_p2pk(&key);
        assert_eq!(
            extract_address(&p2pk, constants::TEST_NETWORK),
            Some(test_p2pkh_address(4))
        );

        let p2sh = test_p2sh_address(2);
        assert_eq!(
            extract_address(&p2sh.script_pubkey(), constants::TEST_NETWORK),
            Some(p2sh)
        );

        let marker = build_marker_script(90, &test_merchant_outpoint(1));
        assert_eq!(extract_address(&marker, constants::TEST_NETWORK), None);
    }
}
