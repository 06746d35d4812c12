//! Instruction wire form: an 8-byte discriminator followed by the
//! instruction as JSON.
//!
//! The discriminator is the first 8 bytes of `sha256("global:<name>")`,
//! so a payload whose body decodes to a different instruction than its
//! prefix announces is rejected.

use xswap_crypto::instruction_discriminator;
use xswap_types::{Instruction, Result, XswapError};

/// Length of the discriminator prefix.
pub const DISCRIMINATOR_LEN: usize = 8;

pub fn encode_instruction(instruction: &Instruction) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(instruction)?;
    let mut out = Vec::with_capacity(DISCRIMINATOR_LEN + body.len());
    out.extend_from_slice(&instruction_discriminator(instruction.name()));
    out.extend_from_slice(&body);
    Ok(out)
}

pub fn decode_instruction(data: &[u8]) -> Result<Instruction> {
    if data.len() < DISCRIMINATOR_LEN {
        return Err(XswapError::MalformedPayload {
            reason: format!("instruction data too short: {} bytes", data.len()),
        });
    }
    let (prefix, body) = data.split_at(DISCRIMINATOR_LEN);
    let instruction: Instruction = serde_json::from_slice(body)?;
    if prefix != instruction_discriminator(instruction.name()).as_slice() {
        return Err(XswapError::MalformedPayload {
            reason: format!(
                "discriminator {} does not match instruction {}",
                hex::encode(prefix),
                instruction.name()
            ),
        });
    }
    Ok(instruction)
}

#[cfg(test)]
mod tests {
    use xswap_types::Pubkey;

    use super::*;

    #[test]
    fn prefix_names_the_instruction() {
        let ix = Instruction::SetPaused { paused: true };
        let data = encode_instruction(&ix).unwrap();
        assert_eq!(&data[..8], &instruction_discriminator("set_paused"));
        assert_eq!(decode_instruction(&data).unwrap(), ix);
    }

    #[test]
    fn mismatched_prefix_rejected() {
        let mut data = encode_instruction(&Instruction::AddAdmin {
            account: Pubkey([4; 32]),
        })
        .unwrap();
        data[..8].copy_from_slice(&instruction_discriminator("remove_admin"));
        assert!(matches!(
            decode_instruction(&data),
            Err(XswapError::MalformedPayload { .. })
        ));
        assert!(decode_instruction(&[1, 2, 3]).is_err());
    }
}
