// Sign-in and the sign-up chain. Shared by the line-prompt bootstrap in
// `prompt` and the embedded Auth view.

use crate::api::{Credentials, RemoteService, Session};
use crate::error::Result;
use crate::records::{self, UserProfile};

/// Sign in and install the session on `service` so later table calls run as
/// this user.
pub fn sign_in<S: RemoteService>(service: &mut S, credentials: &Credentials) -> Result<Session> {
    let session = service.sign_in(credentials)?;
    service.set_session(&session);
    tracing::info!(user_id = %session.user_id, "signed in");
    Ok(session)
}

/// Create the account, sign in with it, then create the profile row.
///
/// Stops at the first failure. Earlier steps are not undone, so a failed
/// profile insert leaves a usable account without a profile.
pub fn sign_up<S: RemoteService>(
    service: &mut S,
    credentials: &Credentials,
    name: &str,
) -> Result<(Session, UserProfile)> {
    service.sign_up(credentials)?;
    tracing::info!(email = %credentials.email, "account created");
    let session = sign_in(service, credentials)?;
    let profile = records::create_user_profile(service, name)?;
    tracing::info!(profile_id = profile.id, "user profile created");
    Ok((session, profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::fake::{user_id_for, FakeService};

    #[test]
    fn sign_in_installs_session() {
        let mut service = FakeService::with_account("a@x.com", "secret");

        let session = sign_in(&mut service, &Credentials::new("a@x.com", "secret")).unwrap();

        assert_eq!(session.user_id, user_id_for("a@x.com"));
        assert_eq!(service.session.as_ref(), Some(&session));
    }

    #[test]
    fn bad_password_leaves_service_unauthenticated() {
        let mut service = FakeService::with_account("a@x.com", "secret");
        assert!(sign_in(&mut service, &Credentials::new("a@x.com", "nope")).is_err());
        assert!(service.session.is_none());
    }

    #[test]
    fn sign_up_runs_the_full_chain_in_order() {
        let mut service = FakeService::default();

        let (session, profile) =
            sign_up(&mut service, &Credentials::new("b@x.com", "pw"), "Bea").unwrap();

        assert_eq!(session.user_id, user_id_for("b@x.com"));
        assert_eq!(profile.name, "Bea");
        assert_eq!(
            service.calls(),
            vec!["sign_up b@x.com", "sign_in b@x.com", "insert users"]
        );
    }

    #[test]
    fn sign_up_stops_at_first_failure() {
        let mut service = FakeService::with_account("b@x.com", "pw");

        assert!(sign_up(&mut service, &Credentials::new("b@x.com", "pw"), "Bea").is_err());
        assert_eq!(service.calls(), vec!["sign_up b@x.com"]);
    }

    #[test]
    fn failed_profile_insert_keeps_the_account() {
        let mut service = FakeService::default();
        service.store.lock().unwrap().fail_tables = Some(500);

        assert!(sign_up(&mut service, &Credentials::new("c@x.com", "pw"), "Cy").is_err());
        assert!(service.store.lock().unwrap().accounts.contains_key("c@x.com"));
        assert!(service.session.is_some());
    }
}
