// Copyright 2023 Ant Group Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Conversions between the flat and DER forms of SM2 ciphertext and of
//! elliptic-curve signatures.
//!
//! DER INTEGERs are signed, so an unsigned coordinate whose top bit is set
//! gains a leading 0x00 and a small one loses its leading zeros. Both
//! directions go through [`fixed_width`] so the flat forms always carry
//! exactly `curve_len` bytes per coordinate.

use super::scheme::Sm2Mode;
use cipher_types::*;
use der::asn1::{OctetStringRef, UIntRef};
use der::{Decode, Encode, Sequence};

pub const SM2_CURVE_BYTE_LEN: usize = 32;
pub const SM3_DIGEST_LEN: usize = 32;

const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

// GM/T 0009-2012 SM2Cipher
#[derive(Sequence)]
struct Sm2CipherDer<'a> {
    x: UIntRef<'a>,
    y: UIntRef<'a>,
    hash: OctetStringRef<'a>,
    cipher_text: OctetStringRef<'a>,
}

// ECDSA-Sig-Value, RFC 3279
#[derive(Sequence)]
struct EcSignatureDer<'a> {
    r: UIntRef<'a>,
    s: UIntRef<'a>,
}

fn der_error(e: der::Error) -> Error {
    errno!(CryptoStatus::MalformedDerStructure, "der error: {}", e).with_cause(e)
}

/// Left-pads or strips leading zeros so that `value` is exactly `width` bytes.
fn fixed_width(value: &[u8], width: usize) -> CryptoResult<Vec<u8>> {
    let first = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    let digits = &value[first..];
    if digits.len() > width {
        return_errno!(
            CryptoStatus::MalformedDerStructure,
            "integer of {} bytes does not fit in {} bytes",
            digits.len(),
            width
        );
    }
    let mut fixed = vec![0u8; width - digits.len()];
    fixed.extend_from_slice(digits);
    Ok(fixed)
}

fn uint(value: &[u8]) -> CryptoResult<UIntRef<'_>> {
    UIntRef::new(value).map_err(der_error)
}

fn octets(value: &[u8]) -> CryptoResult<OctetStringRef<'_>> {
    OctetStringRef::new(value).map_err(der_error)
}

/// The three parts of an SM2 ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sm2CipherComponents {
    /// Ephemeral point, `0x04 || x || y`.
    pub c1: Vec<u8>,
    /// Encrypted body, as long as the plaintext.
    pub c2: Vec<u8>,
    /// Digest over `x || plaintext || y`.
    pub c3: Vec<u8>,
}

impl Sm2CipherComponents {
    pub fn split(
        flat: &[u8],
        mode: Sm2Mode,
        curve_len: usize,
        digest_len: usize,
    ) -> CryptoResult<Sm2CipherComponents> {
        let c1_len = 2 * curve_len + 1;
        if flat.len() < c1_len + digest_len {
            return_errno!(
                CryptoStatus::MalformedDerStructure,
                "sm2 ciphertext of {} bytes is shorter than {}",
                flat.len(),
                c1_len + digest_len
            );
        }
        if flat[0] != UNCOMPRESSED_POINT_TAG {
            return_errno!(
                CryptoStatus::MalformedDerStructure,
                "c1 must be an uncompressed point, got tag {:#04x}",
                flat[0]
            );
        }
        let (c1, rest) = flat.split_at(c1_len);
        let (c2, c3) = match mode {
            Sm2Mode::C1C2C3 => {
                let (c2, c3) = rest.split_at(rest.len() - digest_len);
                (c2, c3)
            }
            Sm2Mode::C1C3C2 => {
                let (c3, c2) = rest.split_at(digest_len);
                (c2, c3)
            }
        };
        Ok(Sm2CipherComponents {
            c1: c1.to_vec(),
            c2: c2.to_vec(),
            c3: c3.to_vec(),
        })
    }

    pub fn join(&self, mode: Sm2Mode) -> Vec<u8> {
        let mut flat = Vec::with_capacity(self.c1.len() + self.c2.len() + self.c3.len());
        flat.extend_from_slice(&self.c1);
        match mode {
            Sm2Mode::C1C2C3 => {
                flat.extend_from_slice(&self.c2);
                flat.extend_from_slice(&self.c3);
            }
            Sm2Mode::C1C3C2 => {
                flat.extend_from_slice(&self.c3);
                flat.extend_from_slice(&self.c2);
            }
        }
        flat
    }

    pub fn to_der(&self, curve_len: usize) -> CryptoResult<Vec<u8>> {
        if self.c1.len() != 2 * curve_len + 1 || self.c1[0] != UNCOMPRESSED_POINT_TAG {
            return_errno!(
                CryptoStatus::MalformedDerStructure,
                "c1 is not an uncompressed point of {} byte coordinates",
                curve_len
            );
        }
        let (x, y) = self.c1[1..].split_at(curve_len);
        let cipher = Sm2CipherDer {
            x: uint(x)?,
            y: uint(y)?,
            hash: octets(&self.c3)?,
            cipher_text: octets(&self.c2)?,
        };
        cipher.to_vec().map_err(der_error)
    }

    pub fn from_der(
        der: &[u8],
        curve_len: usize,
        digest_len: usize,
    ) -> CryptoResult<Sm2CipherComponents> {
        let cipher = Sm2CipherDer::from_der(der).map_err(der_error)?;
        if cipher.hash.as_bytes().len() != digest_len {
            return_errno!(
                CryptoStatus::MalformedDerStructure,
                "sm2 digest is {} bytes, expected {}",
                cipher.hash.as_bytes().len(),
                digest_len
            );
        }
        let mut c1 = Vec::with_capacity(2 * curve_len + 1);
        c1.push(UNCOMPRESSED_POINT_TAG);
        c1.append(&mut fixed_width(cipher.x.as_bytes(), curve_len)?);
        c1.append(&mut fixed_width(cipher.y.as_bytes(), curve_len)?);
        Ok(Sm2CipherComponents {
            c1,
            c2: cipher.cipher_text.as_bytes().to_vec(),
            c3: cipher.hash.as_bytes().to_vec(),
        })
    }
}

/// Flat SM2 ciphertext in the given layout to GM/T 0009-2012 DER.
pub fn flat_to_der(flat: &[u8], mode: Sm2Mode) -> CryptoResult<Vec<u8>> {
    Sm2CipherComponents::split(flat, mode, SM2_CURVE_BYTE_LEN, SM3_DIGEST_LEN)?
        .to_der(SM2_CURVE_BYTE_LEN)
}

/// GM/T 0009-2012 DER to flat SM2 ciphertext in the given layout.
pub fn der_to_flat(der: &[u8], mode: Sm2Mode) -> CryptoResult<Vec<u8>> {
    Ok(Sm2CipherComponents::from_der(der, SM2_CURVE_BYTE_LEN, SM3_DIGEST_LEN)?.join(mode))
}

/// `r || s`, each `curve_len` bytes, to a DER `SEQUENCE { r, s }`.
pub fn raw_to_der_signature(raw: &[u8], curve_len: usize) -> CryptoResult<Vec<u8>> {
    if raw.len() != 2 * curve_len {
        return_errno!(
            CryptoStatus::MalformedDerStructure,
            "raw signature is {} bytes, expected {}",
            raw.len(),
            2 * curve_len
        );
    }
    let (r, s) = raw.split_at(curve_len);
    let signature = EcSignatureDer {
        r: uint(r)?,
        s: uint(s)?,
    };
    signature.to_vec().map_err(der_error)
}

pub fn der_to_raw_signature(der: &[u8], curve_len: usize) -> CryptoResult<Vec<u8>> {
    let signature = EcSignatureDer::from_der(der).map_err(der_error)?;
    let mut raw = fixed_width(signature.r.as_bytes(), curve_len)?;
    raw.append(&mut fixed_width(signature.s.as_bytes(), curve_len)?);
    Ok(raw)
}
