use anyhow::{Context, Result};
use hostdesk_db::models::referral::MAX_REFERRAL_DEPTH;
use hostdesk_db::models::user::User;
use hostdesk_db::repositories::user_repo::UserRepository;
use rand::Rng;
use thiserror::Error;

const REFERRAL_CODE_LEN: usize = 8;
const REFERRAL_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Unknown referral code")]
    UnknownReferralCode,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct UserService {
    users: UserRepository,
}

impl UserService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    pub async fn register(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
        referral_code: Option<&str>,
        country_id: Option<i64>,
    ) -> Result<User, RegisterError> {
        let email = email.trim().to_lowercase();

        if self
            .users
            .get_by_email(&email)
            .await
            .map_err(RegisterError::Other)?
            .is_some()
        {
            return Err(RegisterError::EmailTaken);
        }

        let referrer_id = match referral_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                let referrer = self
                    .users
                    .get_by_referral_code(&code.to_uppercase())
                    .await
                    .map_err(RegisterError::Other)?
                    .ok_or(RegisterError::UnknownReferralCode)?;
                Some(referrer.id)
            }
            None => None,
        };

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .context("Failed to hash password")
            .map_err(RegisterError::Other)?;

        let own_code = self
            .unique_referral_code()
            .await
            .map_err(RegisterError::Other)?;

        let user = self
            .users
            .create(
                &email,
                full_name.trim(),
                &password_hash,
                &own_code,
                referrer_id,
                country_id,
            )
            .await
            .map_err(RegisterError::Other)?;

        Ok(user)
    }

    /// Returns the user only when the password matches and the account is
    /// active.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let ok = bcrypt::verify(password, &user.password_hash)
            .context("Failed to verify password hash")?;
        if !ok || !user.is_active {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Admin relink of a referrer. Rejects assignments that would put the
    /// user into their own upstream chain.
    pub async fn link_referrer(&self, user_id: i64, referrer_id: i64) -> Result<()> {
        if user_id == referrer_id {
            anyhow::bail!("User cannot refer themselves");
        }
        if self.users.get_by_id(referrer_id).await?.is_none() {
            anyhow::bail!("Referrer does not exist");
        }

        // Walk up from the proposed referrer; hitting the user means a cycle.
        let mut current = referrer_id;
        for _ in 0..MAX_REFERRAL_DEPTH {
            match self.users.referrer_of(current).await? {
                Some(ancestor) if ancestor == user_id => {
                    anyhow::bail!("Assignment would create a referral cycle")
                }
                Some(ancestor) => current = ancestor,
                None => break,
            }
        }

        self.users.set_referrer(user_id, referrer_id).await
    }

    async fn unique_referral_code(&self) -> Result<String> {
        // Collisions on an 8-char code are vanishingly rare; bail after a
        // few attempts rather than loop forever on a broken RNG.
        for _ in 0..5 {
            let code = generate_referral_code();
            if self.users.get_by_referral_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
        anyhow::bail!("Could not generate a unique referral code")
    }
}

fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..REFERRAL_CODE_ALPHABET.len());
            REFERRAL_CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_codes_use_unambiguous_alphabet() {
        for _ in 0..100 {
            let code = generate_referral_code();
            assert_eq!(code.len(), REFERRAL_CODE_LEN);
            assert!(code
                .bytes()
                .all(|b| REFERRAL_CODE_ALPHABET.contains(&b)));
            // 0/O and 1/I are excluded to keep codes dictation-safe.
            assert!(!code.contains(['0', 'O', '1', 'I']));
        }
    }
}
