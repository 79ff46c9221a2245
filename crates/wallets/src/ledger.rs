//! Ledger Ethereum app over raw APDUs.

use crate::device::{RawSignature, SigningDevice};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use coins_ledger::{
    common::{APDUCommand, APDUData},
    transports::{Ledger, LedgerAsync},
};
use eyre::{OptionExt, Result, eyre};
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::trace;

/// Default derivation path of the first Ledger Live account.
pub const DEFAULT_HD_PATH: &str = "m/44'/60'/0'/0/0";

const CLA: u8 = 0xe0;
const INS_GET_ADDRESS: u8 = 0x02;
const INS_SIGN: u8 = 0x04;
const INS_SIGN_EIP712_HASHED: u8 = 0x0c;
const P1_FIRST: u8 = 0x00;
const P1_MORE: u8 = 0x80;
const P1_NON_CONFIRM: u8 = 0x00;
const P2_NO_CHAINCODE: u8 = 0x00;
const CHUNK_SIZE: usize = 255;
const SW_OK: u16 = 0x9000;

/// A Ledger device running the Ethereum app.
///
/// Exchanges are serialized: a multi-chunk signing request holds the transport until it completes.
pub struct LedgerDevice {
    transport: Mutex<Ledger>,
    path: Vec<u32>,
}

impl std::fmt::Debug for LedgerDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerDevice").field("path", &self.path).finish_non_exhaustive()
    }
}

impl LedgerDevice {
    /// Connects to the first available device.
    pub async fn connect(hd_path: &str) -> Result<Self> {
        let path = parse_hd_path(hd_path)?;
        let transport = Ledger::init().await.map_err(|err| eyre!("{err}"))?;
        Ok(Self { transport: Mutex::new(transport), path })
    }

    async fn exchange(&self, transport: &Ledger, ins: u8, p1: u8, data: &[u8]) -> Result<Vec<u8>> {
        let command = APDUCommand {
            cla: CLA,
            ins,
            p1,
            p2: P2_NO_CHAINCODE,
            data: APDUData::new(data),
            response_len: None,
        };
        trace!(ins, p1, len = data.len(), "sending APDU");
        let answer = transport.exchange(&command).await.map_err(|err| eyre!("{err}"))?;
        if answer.retcode() != SW_OK {
            eyre::bail!("ledger returned status {:#06x}", answer.retcode());
        }
        Ok(answer.data().unwrap_or_default().to_vec())
    }

    /// Sends `payload` prefixed with the derivation path, split into chunks.
    async fn sign_chunked(&self, ins: u8, payload: &[u8]) -> Result<RawSignature> {
        let mut data = encode_path(&self.path);
        data.extend_from_slice(payload);

        let transport = self.transport.lock().await;
        let mut response = Vec::new();
        for (i, chunk) in data.chunks(CHUNK_SIZE).enumerate() {
            let p1 = if i == 0 { P1_FIRST } else { P1_MORE };
            response = self.exchange(&transport, ins, p1, chunk).await?;
        }
        parse_signature(&response)
    }
}

#[async_trait]
impl SigningDevice for LedgerDevice {
    async fn address(&self) -> Result<Address> {
        let transport = self.transport.lock().await;
        let data = encode_path(&self.path);
        let response =
            self.exchange(&transport, INS_GET_ADDRESS, P1_NON_CONFIRM, &data).await?;
        parse_address(&response)
    }

    async fn sign_transaction_payload(&self, payload: &[u8]) -> Result<RawSignature> {
        self.sign_chunked(INS_SIGN, payload).await
    }

    async fn sign_typed_data_hashed(
        &self,
        domain_separator: B256,
        struct_hash: B256,
    ) -> Result<RawSignature> {
        let mut data = encode_path(&self.path);
        data.extend_from_slice(domain_separator.as_slice());
        data.extend_from_slice(struct_hash.as_slice());

        let transport = self.transport.lock().await;
        let response = self.exchange(&transport, INS_SIGN_EIP712_HASHED, P1_FIRST, &data).await?;
        parse_signature(&response)
    }
}

/// Parses a BIP-32 path such as `m/44'/60'/0'/0/0`.
pub fn parse_hd_path(path: &str) -> Result<Vec<u32>> {
    let rest = path.strip_prefix("m/").ok_or_eyre("derivation path must start with `m/`")?;
    rest.split('/')
        .map(|component| {
            let (index, hardened) = match component.strip_suffix('\'') {
                Some(index) => (index, true),
                None => (component, false),
            };
            let index = u32::from_str(index)
                .map_err(|_| eyre!("invalid derivation path component `{component}`"))?;
            if index & 0x8000_0000 != 0 {
                eyre::bail!("derivation path component `{component}` is out of range");
            }
            Ok(if hardened { index | 0x8000_0000 } else { index })
        })
        .collect()
}

fn encode_path(path: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + path.len() * 4);
    out.push(path.len() as u8);
    for component in path {
        out.extend_from_slice(&component.to_be_bytes());
    }
    out
}

/// Response layout: `v (1) ++ r (32) ++ s (32)`.
fn parse_signature(data: &[u8]) -> Result<RawSignature> {
    if data.len() < 65 {
        eyre::bail!("signature response too short ({} bytes)", data.len());
    }
    Ok(RawSignature {
        v: data[0],
        r: U256::from_be_slice(&data[1..33]),
        s: U256::from_be_slice(&data[33..65]),
    })
}

/// Response layout: `pk_len ++ pk ++ addr_len ++ hex(addr)`.
fn parse_address(data: &[u8]) -> Result<Address> {
    let pk_len = *data.first().ok_or_eyre("empty address response")? as usize;
    let offset = 1 + pk_len;
    let addr_len = *data.get(offset).ok_or_eyre("truncated address response")? as usize;
    let hex = data.get(offset + 1..offset + 1 + addr_len).ok_or_eyre("truncated address response")?;
    let hex = std::str::from_utf8(hex)?;
    Ok(Address::from_str(hex)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_path() {
        let path = parse_hd_path(DEFAULT_HD_PATH).unwrap();
        assert_eq!(path, [0x8000_002c, 0x8000_003c, 0x8000_0000, 0, 0]);
        assert_eq!(encode_path(&path)[..5], [5, 0x80, 0, 0, 0x2c]);
        assert!(parse_hd_path("44'/60'").is_err());
        assert!(parse_hd_path("m/44'/x").is_err());
    }

    #[test]
    fn parses_responses() {
        let mut data = vec![3, 1, 2, 3, 40];
        data.extend_from_slice(b"E1CB04A0fA36DdD16a06ea828007E35e1a3cBC37");
        assert_eq!(
            parse_address(&data).unwrap(),
            "0xE1CB04A0fA36DdD16a06ea828007E35e1a3cBC37".parse::<Address>().unwrap()
        );

        let mut sig = vec![0x26];
        sig.extend_from_slice(&[1; 32]);
        sig.extend_from_slice(&[2; 32]);
        let raw = parse_signature(&sig).unwrap();
        assert_eq!(raw.v, 0x26);
        assert_eq!(raw.s, U256::from_be_slice(&[2; 32]));
        assert!(parse_signature(&sig[..64]).is_err());
    }
}
