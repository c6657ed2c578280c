//! Credential callbacks for fetching schema repositories
//!
//! Authentication is delegated to git's native mechanisms: the SSH agent,
//! default keys in `~/.ssh/` and configured credential helpers. Public
//! HTTPS repositories fall through to anonymous credentials.

use git2::{Cred, CredentialType, Error, ErrorClass, ErrorCode, RemoteCallbacks};

const SSH_KEY_NAMES: &[&str] = &["id_ed25519", "id_rsa", "id_ecdsa"];

fn auth_failed(message: &str) -> Error {
    Error::new(ErrorCode::Auth, ErrorClass::Http, message)
}

fn ssh_key_credentials(username: &str) -> Result<Cred, Error> {
    let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");

    SSH_KEY_NAMES
        .iter()
        .map(|name| (ssh_dir.join(name), ssh_dir.join(format!("{name}.pub"))))
        .filter(|(private_key, _)| private_key.exists())
        .find_map(|(private_key, public_key)| {
            let public_key = public_key.exists().then_some(public_key.as_path());
            Cred::ssh_key(username, public_key, &private_key, None).ok()
        })
        .ok_or_else(|| auth_failed("SSH key not found"))
}

fn user_pass_credentials(url: &str, username_from_url: Option<&str>) -> Result<Cred, Error> {
    let config = git2::Config::open_default().or_else(|_| git2::Config::new())?;

    if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
        return Ok(cred);
    }

    // Anonymous access so the server reports the real error for public repos
    Cred::userpass_plaintext(username_from_url.unwrap_or(""), "")
}

/// Install credential callbacks on `callbacks`
pub fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks) {
    callbacks.credentials(|url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            let username = username_from_url.unwrap_or("git");
            return Cred::ssh_key_from_agent(username).or_else(|_| ssh_key_credentials(username));
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            return user_pass_credentials(url, username_from_url);
        }

        Err(auth_failed("authentication failed"))
    });
}
