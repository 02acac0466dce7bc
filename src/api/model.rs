use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Label prepended to a domain to form its [DNS-01] challenge name.
///
/// [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4
pub(crate) const CHALLENGE_LABEL: &str = "_acme-challenge";

/// The form parameters of a `/hook` call, named like the ACME hook variables the reverse proxy
/// passes along. `ACME_HOOK` and `ACME_DOMAIN` must be present; the rest are optional.
#[derive(Deserialize, Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct HookRequest {
    #[serde(rename = "ACME_HOOK")]
    pub hook: String,
    #[serde(rename = "ACME_DOMAIN")]
    pub domain: String,
    #[serde(rename = "ACME_KEYAUTH", default)]
    pub keyauth: Option<String>,
    // Informational only: logged, never acted on.
    #[serde(rename = "ACME_CLIENT", default)]
    pub client: Option<String>,
    #[serde(rename = "ACME_CHALLENGE", default)]
    pub challenge: Option<String>,
    #[serde(rename = "ACME_TOKEN", default)]
    pub token: Option<String>,
}

/// A validated hook call, ready to apply to the [TXT store][crate::txt_store].
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum HookCommand {
    Add { challenge: String, keyauth: String },
    Remove { challenge: String },
}

impl TryFrom<HookRequest> for HookCommand {
    type Error = Error;

    fn try_from(req: HookRequest) -> Result<Self, Self::Error> {
        match req.hook.trim() {
            "" => Err(Error::MissingParam("ACME_HOOK")),
            "add" => {
                let challenge = challenge_name(required(&req.domain, "ACME_DOMAIN")?.trim());
                // Published exactly as sent.
                let keyauth = required(req.keyauth.as_deref().unwrap_or_default(), "ACME_KEYAUTH")?;
                Ok(HookCommand::Add {
                    challenge,
                    keyauth: keyauth.to_string(),
                })
            }
            "remove" => {
                let challenge = challenge_name(required(&req.domain, "ACME_DOMAIN")?.trim());
                Ok(HookCommand::Remove { challenge })
            }
            other => Err(Error::UnknownHook(other.to_string())),
        }
    }
}

/// `value` unchanged, unless it is empty or only whitespace.
fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, Error> {
    if value.trim().is_empty() {
        Err(Error::MissingParam(name))
    } else {
        Ok(value)
    }
}

/// The fully qualified challenge name for a domain: `_acme-challenge.<domain>.`
///
/// A wildcard identifier's challenge lives under its base domain, so a leading `*.` is dropped.
pub(crate) fn challenge_name(domain: &str) -> String {
    let domain = domain.trim_end_matches('.');
    let domain = domain.strip_prefix("*.").unwrap_or(domain);
    format!("{CHALLENGE_LABEL}.{domain}.")
}

#[derive(Serialize, Debug, Clone, Default, Eq, PartialEq)]
pub(super) struct HookResult {
    pub record: String,
    pub message: String,
}
