use serde::{Deserialize, Serialize};
use url::Url;

/// Connection metadata with secrets redacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactedConnection {
    pub engine: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub redacted: String,
}

/// Redact secrets from a connection string while extracting non-sensitive metadata.
///
/// Strings that do not parse as a URL are replaced wholesale, since there is
/// no reliable way to locate the password inside them.
pub fn redact_connection_string(conn: &str) -> RedactedConnection {
    let Ok(mut parsed) = Url::parse(conn) else {
        return RedactedConnection {
            engine: None,
            user: None,
            host: None,
            port: None,
            database: None,
            redacted: "<redacted>".to_string(),
        };
    };

    if parsed.password().is_some() {
        let _ = parsed.set_password(Some("***"));
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| {
            let value = if is_sensitive_key(&key) {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    if !pairs.is_empty() {
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
    }

    let user = Some(parsed.username().to_string()).filter(|user| !user.is_empty());
    let database = parsed
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    RedactedConnection {
        engine: Some(parsed.scheme().to_string()),
        user,
        host: parsed.host_str().map(str::to_string),
        port: parsed.port(),
        database,
        redacted: parsed.to_string(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "password" | "pass" | "token" | "api_key" | "apikey" | "sslpassword"
    )
}
