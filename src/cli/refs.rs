//! # Refs Command
//!
//! Prints the `namespace/name` of every secret a manifest references, as the
//! reverse index would record it.

use anyhow::{bail, Context, Result};
use cert_mirror_controller::crd::{Certificate, Issuer};
use cert_mirror_controller::index::{secret_names_from_certificate, secret_names_from_issuer};
use std::path::Path;

pub fn refs_command(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    for key in extract_refs(&content)? {
        println!("{key}");
    }
    Ok(())
}

fn extract_refs(manifest: &str) -> Result<Vec<String>> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(manifest).context("Failed to parse manifest")?;
    let kind = value
        .get("kind")
        .and_then(serde_yaml::Value::as_str)
        .unwrap_or_default()
        .to_string();

    match kind.as_str() {
        "Certificate" => {
            let cert: Certificate =
                serde_yaml::from_value(value).context("Failed to parse Certificate")?;
            Ok(secret_names_from_certificate(&cert))
        }
        "Issuer" => {
            let issuer: Issuer = serde_yaml::from_value(value).context("Failed to parse Issuer")?;
            Ok(secret_names_from_issuer(&issuer))
        }
        other => bail!("unsupported kind '{other}', expected Certificate or Issuer"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_keystore_refs() {
        let manifest = r"
apiVersion: cert-manager.io/v1
kind: Certificate
metadata:
  name: web
  namespace: team1
spec:
  secretName: tls-web
  issuerRef:
    name: iss-a
  keystores:
    jks:
      create: true
      passwordSecretRef:
        name: jks-pass
        key: password
";
        assert_eq!(extract_refs(manifest).unwrap(), vec!["team1/jks-pass".to_string()]);
    }

    #[test]
    fn test_issuer_ca_ref() {
        let manifest = r"
apiVersion: cert-manager.io/v1
kind: Issuer
metadata:
  name: ca-issuer
  namespace: team1
spec:
  ca:
    secretName: ca1
";
        assert_eq!(extract_refs(manifest).unwrap(), vec!["team1/ca1".to_string()]);
    }

    #[test]
    fn test_unsupported_kind() {
        let manifest = "apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n";
        assert!(extract_refs(manifest).is_err());
    }
}
