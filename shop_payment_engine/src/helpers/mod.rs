mod email_cipher;
mod mailer;
mod passwords;
mod tokens;
mod url_signer;

pub use email_cipher::{CipherError, EmailCipher};
pub use mailer::{LogMailer, MailError, Mailer};
pub use passwords::{hash_password, hash_password_async, password_matches, password_matches_async, DEFAULT_BCRYPT_COST};
pub use tokens::{generate_token_plaintext, hash_token, TOKEN_LENGTH};
pub use url_signer::{SignerError, UrlSigner};
