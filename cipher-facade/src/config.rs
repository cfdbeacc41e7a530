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

use cipher_facade::utils::crypto::sm2::SM2_ID_DEFAULT;
use cipher_types::*;
use clap::{Args, Parser, Subcommand};
use merge::Merge;
use serde::Deserialize;
use std::{fs::File, io::BufReader};

#[derive(Parser)]
#[clap(name = "cipher-facade", about = "Encrypt, decrypt, sign and verify")]
pub struct LineArgs {
    #[clap(long = "config_path", default_value = "/host/config.yaml")]
    pub config_path: std::path::PathBuf,

    /// Rest of arguments
    #[clap(flatten)]
    pub config: Config,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Parser, Deserialize, Merge, Default)]
#[serde(default)]
pub struct Config {
    /// log config
    #[clap(flatten)]
    pub log_config: LogConfig,
    /// cipher transformation, e.g. AES/CBC/PKCS5Padding
    #[clap(long)]
    pub transformation: Option<String>,
    /// signature algorithm, e.g. SHA256withRSA, SM3withSM2
    #[clap(long)]
    pub signature_algorithm: Option<String>,
    /// flat SM2 ciphertext layout: C1C2C3 or C1C3C2
    #[clap(long)]
    pub sm2_mode: Option<String>,
    /// SM2 signer distinguishing identifier
    #[clap(long)]
    pub sm2_id: Option<String>,
}

#[derive(Parser, Deserialize, Merge, Default)]
#[serde(default)]
pub struct LogConfig {
    /// log file name
    #[clap(long = "log_config.log_file_name")]
    pub log_file_name: Option<String>,
    /// log level
    #[clap(long = "log_config.log_level")]
    pub log_level: Option<String>,
    /// enable console logger
    #[clap(long = "log_config.enable_console_logger")]
    pub enable_console_logger: Option<bool>,
    /// log window size
    #[clap(long = "log_config.log_window_size")]
    pub log_window_size: Option<u32>,
    /// log size limit, MB
    #[clap(long = "log_config.log_size_limit")]
    pub log_size_limit: Option<u64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encrypt UTF-8 text, printing Base64 ciphertext
    Encrypt(CipherArgs),
    /// Decrypt Base64 ciphertext, printing UTF-8 text
    Decrypt(CipherArgs),
    /// Sign UTF-8 text with a PKCS#8 private key, printing a Base64 signature
    Sign(SignArgs),
    /// Verify a Base64 signature over UTF-8 text with an X.509 public key
    Verify(VerifyArgs),
    /// Generate a key pair, printing Base64 DER keys
    Genkey(GenkeyArgs),
    /// Print the algorithm of a Base64 DER or PEM key
    InspectKey(InspectKeyArgs),
}

#[derive(Args)]
pub struct CipherArgs {
    /// Base64 key: raw bytes for symmetric ciphers, DER for RSA and SM2
    #[clap(long)]
    pub key: String,
    /// iv as UTF-8 text
    #[clap(long)]
    pub iv: Option<String>,
    /// iv as hex
    #[clap(long = "iv_hex")]
    pub iv_hex: Option<String>,
    #[clap(long)]
    pub data: String,
}

#[derive(Args)]
pub struct SignArgs {
    #[clap(long)]
    pub key: String,
    #[clap(long)]
    pub data: String,
    /// fixed-length r||s instead of DER for EC and SM2
    #[clap(long)]
    pub raw: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[clap(long)]
    pub key: String,
    #[clap(long)]
    pub data: String,
    #[clap(long)]
    pub signature: String,
    #[clap(long)]
    pub raw: bool,
}

#[derive(Args)]
pub struct GenkeyArgs {
    /// RSA, SM2 or EC (P-256)
    #[clap(long, default_value = "RSA")]
    pub algorithm: String,
    /// RSA modulus length
    #[clap(long, default_value_t = 2048)]
    pub bits: u32,
}

#[derive(Args)]
pub struct InspectKeyArgs {
    #[clap(long)]
    pub key: String,
    /// the Base64 key is PKCS#8 rather than X.509
    #[clap(long)]
    pub private: bool,
}

impl Config {
    fn defaults() -> Config {
        Config {
            log_config: LogConfig {
                log_file_name: Some("log/cipher-facade.log".to_owned()),
                log_level: Some("info".to_owned()),
                enable_console_logger: Some(false),
                log_window_size: Some(10),
                log_size_limit: Some(100),
            },
            transformation: Some("AES/CBC/PKCS5Padding".to_owned()),
            signature_algorithm: Some("SHA256withRSA".to_owned()),
            sm2_mode: Some("C1C2C3".to_owned()),
            sm2_id: Some(SM2_ID_DEFAULT.to_owned()),
        }
    }

    /// Command line flags win over the config file, which wins over defaults.
    pub fn new() -> CryptoResult<(Config, Command)> {
        // Parse whole args with clap
        let args = LineArgs::parse();
        let mut config = args.config;

        // Get config file
        if let Ok(f) = File::open(&args.config_path) {
            // Parse config with serde
            let file_config =
                serde_yaml::from_reader::<_, Config>(BufReader::new(f)).map_err(|e| {
                    errno!(
                        CryptoStatus::InvalidArgument,
                        "Error in configuration file {}: {}",
                        args.config_path.display(),
                        e
                    )
                    .with_cause(e)
                })?;
            // merge config already parsed from clap
            config.merge(file_config);
        }
        config.merge(Config::defaults());
        Ok((config, args.command))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_win_over_file_and_defaults() {
        let args = LineArgs::parse_from([
            "cipher-facade",
            "--transformation",
            "DES/ECB/PKCS5Padding",
            "--log_config.log_level",
            "debug",
            "genkey",
            "--algorithm",
            "SM2",
        ]);
        let mut config = args.config;
        let file_config: Config = serde_yaml::from_str(
            "transformation: AES/CTR/NoPadding\nsm2_mode: C1C3C2\nlog_config:\n  log_window_size: 3\n",
        )
        .unwrap();
        config.merge(file_config);
        config.merge(Config::defaults());
        assert_eq!(config.transformation.as_deref(), Some("DES/ECB/PKCS5Padding"));
        assert_eq!(config.sm2_mode.as_deref(), Some("C1C3C2"));
        assert_eq!(config.log_config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_config.log_window_size, Some(3));
        assert_eq!(config.log_config.log_size_limit, Some(100));
        assert_eq!(config.sm2_id.as_deref(), Some(SM2_ID_DEFAULT));
        match args.command {
            Command::Genkey(genkey) => {
                assert_eq!(genkey.algorithm, "SM2");
                assert_eq!(genkey.bits, 2048);
            }
            _ => panic!("expected genkey"),
        }
    }

    #[test]
    fn subcommand_names() {
        let args = LineArgs::parse_from([
            "cipher-facade",
            "inspect-key",
            "--key",
            "AAAA",
            "--private",
        ]);
        assert!(matches!(args.command, Command::InspectKey(ref inspect) if inspect.private));
        let args = LineArgs::parse_from([
            "cipher-facade",
            "encrypt",
            "--key",
            "AAAA",
            "--iv_hex",
            "00ff",
            "--data",
            "hello",
        ]);
        match args.command {
            Command::Encrypt(cipher) => {
                assert_eq!(cipher.iv_hex.as_deref(), Some("00ff"));
                assert!(cipher.iv.is_none());
            }
            _ => panic!("expected encrypt"),
        }
    }
}
