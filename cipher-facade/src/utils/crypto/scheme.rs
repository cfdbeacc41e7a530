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

use super::registry;
use cipher_types::*;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Aes,
    Des,
    DesEde,
    Blowfish,
    Sm4,
    Rsa,
    Sm2,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Aes,
        Algorithm::Des,
        Algorithm::DesEde,
        Algorithm::Blowfish,
        Algorithm::Sm4,
        Algorithm::Rsa,
        Algorithm::Sm2,
    ];

    pub fn is_symmetric(&self) -> bool {
        !matches!(self, Algorithm::Rsa | Algorithm::Sm2)
    }

    /// Cipher block size in bytes, `None` for the asymmetric algorithms.
    pub fn block_size(&self) -> Option<usize> {
        match self {
            Algorithm::Des | Algorithm::DesEde | Algorithm::Blowfish => Some(8),
            Algorithm::Aes | Algorithm::Sm4 => Some(16),
            Algorithm::Rsa | Algorithm::Sm2 => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
            Algorithm::Des => "DES",
            Algorithm::DesEde => "DESede",
            Algorithm::Blowfish => "Blowfish",
            Algorithm::Sm4 => "SM4",
            Algorithm::Rsa => "RSA",
            Algorithm::Sm2 => "SM2",
        }
    }
}

impl FromStr for Algorithm {
    type Err = cipher_types::Error;
    // case insensitive
    fn from_str(input: &str) -> CryptoResult<Algorithm> {
        match input.to_uppercase().as_str() {
            "AES" => Ok(Algorithm::Aes),
            "DES" => Ok(Algorithm::Des),
            "DESEDE" | "TRIPLEDES" | "3DES" => Ok(Algorithm::DesEde),
            "BLOWFISH" => Ok(Algorithm::Blowfish),
            "SM4" => Ok(Algorithm::Sm4),
            "RSA" => Ok(Algorithm::Rsa),
            "SM2" => Ok(Algorithm::Sm2),
            _ => Err(errno!(
                CryptoStatus::UnsupportedAlgorithm,
                "unknown algorithm: {}",
                input
            )),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    None,
    Ecb,
    Cbc,
    Cfb,
    Ofb,
    Ctr,
}

impl Mode {
    pub const ALL: [Mode; 6] = [Mode::None, Mode::Ecb, Mode::Cbc, Mode::Cfb, Mode::Ofb, Mode::Ctr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::None => "NONE",
            Mode::Ecb => "ECB",
            Mode::Cbc => "CBC",
            Mode::Cfb => "CFB",
            Mode::Ofb => "OFB",
            Mode::Ctr => "CTR",
        }
    }
}

impl FromStr for Mode {
    type Err = cipher_types::Error;
    fn from_str(input: &str) -> CryptoResult<Mode> {
        match input.to_uppercase().as_str() {
            "NONE" => Ok(Mode::None),
            "ECB" => Ok(Mode::Ecb),
            "CBC" => Ok(Mode::Cbc),
            "CFB" => Ok(Mode::Cfb),
            "OFB" => Ok(Mode::Ofb),
            "CTR" => Ok(Mode::Ctr),
            _ => Err(errno!(
                CryptoStatus::InvalidModePaddingCombination,
                "unknown mode: {}",
                input
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Padding {
    NoPadding,
    Pkcs1,
    Pkcs5,
    Pkcs7,
    Iso10126,
    Oaep,
    Ssl3,
}

impl Padding {
    pub const ALL: [Padding; 7] = [
        Padding::NoPadding,
        Padding::Pkcs1,
        Padding::Pkcs5,
        Padding::Pkcs7,
        Padding::Iso10126,
        Padding::Oaep,
        Padding::Ssl3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Padding::NoPadding => "NoPadding",
            Padding::Pkcs1 => "PKCS1Padding",
            Padding::Pkcs5 => "PKCS5Padding",
            Padding::Pkcs7 => "PKCS7Padding",
            Padding::Iso10126 => "ISO10126Padding",
            Padding::Oaep => "OAEPPadding",
            Padding::Ssl3 => "SSL3Padding",
        }
    }
}

impl FromStr for Padding {
    type Err = cipher_types::Error;
    fn from_str(input: &str) -> CryptoResult<Padding> {
        match input.to_uppercase().as_str() {
            "NOPADDING" => Ok(Padding::NoPadding),
            "PKCS1PADDING" => Ok(Padding::Pkcs1),
            "PKCS5PADDING" => Ok(Padding::Pkcs5),
            "PKCS7PADDING" => Ok(Padding::Pkcs7),
            "ISO10126PADDING" => Ok(Padding::Iso10126),
            "OAEPPADDING" => Ok(Padding::Oaep),
            "SSL3PADDING" => Ok(Padding::Ssl3),
            _ => Err(errno!(
                CryptoStatus::InvalidModePaddingCombination,
                "unknown padding: {}",
                input
            )),
        }
    }
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An algorithm/mode/padding triple that passed the registry.
///
/// The fields are private so that `AlgorithmSpec::new` (and the parsers built
/// on it) stay the only way to get one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlgorithmSpec {
    algorithm: Algorithm,
    mode: Mode,
    padding: Padding,
}

impl AlgorithmSpec {
    pub fn new(algorithm: Algorithm, mode: Mode, padding: Padding) -> CryptoResult<AlgorithmSpec> {
        registry::check_combination(algorithm, mode, padding)?;
        Ok(AlgorithmSpec {
            algorithm,
            mode,
            padding,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn block_size(&self) -> Option<usize> {
        self.algorithm.block_size()
    }
}

impl FromStr for AlgorithmSpec {
    type Err = cipher_types::Error;
    // "AES/CBC/PKCS5Padding", or a bare algorithm name with its default mode and padding
    fn from_str(input: &str) -> CryptoResult<AlgorithmSpec> {
        let parts: Vec<&str> = input.trim().split('/').collect();
        match parts.as_slice() {
            [algorithm] => {
                let algorithm = Algorithm::from_str(algorithm)?;
                let (mode, padding) = match algorithm {
                    Algorithm::Rsa => (Mode::Ecb, Padding::Pkcs1),
                    Algorithm::Sm2 => (Mode::None, Padding::NoPadding),
                    _ => (Mode::Ecb, Padding::Pkcs5),
                };
                AlgorithmSpec::new(algorithm, mode, padding)
            }
            [algorithm, mode, padding] => AlgorithmSpec::new(
                Algorithm::from_str(algorithm)?,
                Mode::from_str(mode)?,
                Padding::from_str(padding)?,
            ),
            _ => Err(errno!(
                CryptoStatus::InvalidArgument,
                "malformed transformation: {}",
                input
            )),
        }
    }
}

impl fmt::Display for AlgorithmSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}/{}", self.algorithm, self.mode, self.padding)
    }
}

/// Algorithm family a key belongs to, read from its AlgorithmIdentifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Ec,
    Sm2,
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ec => "EC",
            KeyAlgorithm::Sm2 => "SM2",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    Md5WithRsa,
    Sha1WithRsa,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
    Sha1WithEcdsa,
    Sha256WithEcdsa,
    Sha384WithEcdsa,
    Sha512WithEcdsa,
    Sm3WithSm2,
}

/// Digest half of a signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestScheme {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Sm3,
}

impl SignatureAlgorithm {
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            SignatureAlgorithm::Md5WithRsa
            | SignatureAlgorithm::Sha1WithRsa
            | SignatureAlgorithm::Sha256WithRsa
            | SignatureAlgorithm::Sha384WithRsa
            | SignatureAlgorithm::Sha512WithRsa => KeyAlgorithm::Rsa,
            SignatureAlgorithm::Sha1WithEcdsa
            | SignatureAlgorithm::Sha256WithEcdsa
            | SignatureAlgorithm::Sha384WithEcdsa
            | SignatureAlgorithm::Sha512WithEcdsa => KeyAlgorithm::Ec,
            SignatureAlgorithm::Sm3WithSm2 => KeyAlgorithm::Sm2,
        }
    }

    pub fn digest(&self) -> DigestScheme {
        match self {
            SignatureAlgorithm::Md5WithRsa => DigestScheme::Md5,
            SignatureAlgorithm::Sha1WithRsa | SignatureAlgorithm::Sha1WithEcdsa => {
                DigestScheme::Sha1
            }
            SignatureAlgorithm::Sha256WithRsa | SignatureAlgorithm::Sha256WithEcdsa => {
                DigestScheme::Sha256
            }
            SignatureAlgorithm::Sha384WithRsa | SignatureAlgorithm::Sha384WithEcdsa => {
                DigestScheme::Sha384
            }
            SignatureAlgorithm::Sha512WithRsa | SignatureAlgorithm::Sha512WithEcdsa => {
                DigestScheme::Sha512
            }
            SignatureAlgorithm::Sm3WithSm2 => DigestScheme::Sm3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Md5WithRsa => "MD5withRSA",
            SignatureAlgorithm::Sha1WithRsa => "SHA1withRSA",
            SignatureAlgorithm::Sha256WithRsa => "SHA256withRSA",
            SignatureAlgorithm::Sha384WithRsa => "SHA384withRSA",
            SignatureAlgorithm::Sha512WithRsa => "SHA512withRSA",
            SignatureAlgorithm::Sha1WithEcdsa => "SHA1withECDSA",
            SignatureAlgorithm::Sha256WithEcdsa => "SHA256withECDSA",
            SignatureAlgorithm::Sha384WithEcdsa => "SHA384withECDSA",
            SignatureAlgorithm::Sha512WithEcdsa => "SHA512withECDSA",
            SignatureAlgorithm::Sm3WithSm2 => "SM3withSM2",
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = cipher_types::Error;
    fn from_str(input: &str) -> CryptoResult<SignatureAlgorithm> {
        match input.to_uppercase().as_str() {
            "MD5WITHRSA" => Ok(SignatureAlgorithm::Md5WithRsa),
            "SHA1WITHRSA" => Ok(SignatureAlgorithm::Sha1WithRsa),
            "SHA256WITHRSA" => Ok(SignatureAlgorithm::Sha256WithRsa),
            "SHA384WITHRSA" => Ok(SignatureAlgorithm::Sha384WithRsa),
            "SHA512WITHRSA" => Ok(SignatureAlgorithm::Sha512WithRsa),
            "SHA1WITHECDSA" => Ok(SignatureAlgorithm::Sha1WithEcdsa),
            "SHA256WITHECDSA" => Ok(SignatureAlgorithm::Sha256WithEcdsa),
            "SHA384WITHECDSA" => Ok(SignatureAlgorithm::Sha384WithEcdsa),
            "SHA512WITHECDSA" => Ok(SignatureAlgorithm::Sha512WithEcdsa),
            "SM3WITHSM2" => Ok(SignatureAlgorithm::Sm3WithSm2),
            _ => Err(errno!(
                CryptoStatus::UnsupportedAlgorithm,
                "unknown signature algorithm: {}",
                input
            )),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order of the three SM2 ciphertext parts in the flat buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sm2Mode {
    #[default]
    C1C2C3,
    C1C3C2,
}

impl FromStr for Sm2Mode {
    type Err = cipher_types::Error;
    fn from_str(input: &str) -> CryptoResult<Sm2Mode> {
        match input.to_uppercase().as_str() {
            "C1C2C3" => Ok(Sm2Mode::C1C2C3),
            "C1C3C2" => Ok(Sm2Mode::C1C3C2),
            _ => Err(errno!(
                CryptoStatus::InvalidArgument,
                "unknown sm2 mode: {}",
                input
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transformation_round_trips_through_display() {
        let spec = AlgorithmSpec::from_str("aes/cbc/pkcs5padding").unwrap();
        assert_eq!(spec.algorithm(), Algorithm::Aes);
        assert_eq!(spec.mode(), Mode::Cbc);
        assert_eq!(spec.padding(), Padding::Pkcs5);
        assert_eq!(spec.to_string(), "AES/CBC/PKCS5Padding");
        assert_eq!(AlgorithmSpec::from_str(&spec.to_string()).unwrap(), spec);
    }

    #[test]
    fn bare_names_take_default_mode_and_padding() {
        let rsa = AlgorithmSpec::from_str("RSA").unwrap();
        assert_eq!(rsa.to_string(), "RSA/ECB/PKCS1Padding");
        let sm2 = AlgorithmSpec::from_str("sm2").unwrap();
        assert_eq!(sm2.to_string(), "SM2/NONE/NoPadding");
        let des = AlgorithmSpec::from_str("DESede").unwrap();
        assert_eq!(des.to_string(), "DESede/ECB/PKCS5Padding");
    }

    #[test]
    fn illegal_triples_cannot_be_built() {
        let err = AlgorithmSpec::new(Algorithm::Aes, Mode::None, Padding::Pkcs5).unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::InvalidModePaddingCombination);
        let err = AlgorithmSpec::from_str("AES/CBC/PKCS1Padding").unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::InvalidModePaddingCombination);
        let err = AlgorithmSpec::from_str("RC4").unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::UnsupportedAlgorithm);
        let err = AlgorithmSpec::from_str("AES/CBC").unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::InvalidArgument);
    }

    #[test]
    fn signature_algorithm_names() {
        let alg = SignatureAlgorithm::from_str("sha256withecdsa").unwrap();
        assert_eq!(alg, SignatureAlgorithm::Sha256WithEcdsa);
        assert_eq!(alg.key_algorithm(), KeyAlgorithm::Ec);
        assert_eq!(alg.digest(), DigestScheme::Sha256);
        assert_eq!(
            SignatureAlgorithm::from_str("SM3withSM2").unwrap().to_string(),
            "SM3withSM2"
        );
    }
}
