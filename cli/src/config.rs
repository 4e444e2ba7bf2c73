use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the database location.
pub const DB_ENV_VAR: &str = "NUTRITRACK_DB";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("", "", "nutritrack")
            .context("Could not determine home directory")?;

        let mut config = Self::in_dir(proj_dirs.data_dir())?;
        if let Some(path) = std::env::var_os(DB_ENV_VAR).filter(|p| !p.is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        Ok(config)
    }

    fn in_dir(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("nutritrack.db"),
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn api_key_path(&self) -> PathBuf {
        self.data_dir.join("api_key")
    }

    /// Read the REST API key, generating and storing a new one when the file
    /// is missing or blank.
    pub fn load_or_create_api_key(&self) -> Result<ApiKey> {
        let path = self.api_key_path();
        if let Some(key) = read_api_key(&path)? {
            return Ok(ApiKey {
                key,
                created: false,
            });
        }

        let key = generate_api_key();
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        Ok(ApiKey { key, created: true })
    }
}

pub struct ApiKey {
    pub key: String,
    /// True when this call wrote a fresh key to disk.
    pub created: bool,
}

fn read_api_key(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).context("Failed to read API key file")?;
    let key = text.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

/// 32 random bytes as lowercase hex.
fn generate_api_key() -> String {
    use rand::Rng;
    use std::fmt::Write;

    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
