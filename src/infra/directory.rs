//! LDAP directory adapter.
//!
//! Mirrors LDAP-backed accounts into the directory. Every operation opens
//! its own connection, binds with the service account and unbinds when done.

use std::collections::HashSet;

use async_trait::async_trait;
use ldap3::{dn_escape, ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::config::{LdapSettings, LDAP_USER_OBJECT_CLASSES};
use crate::domain::{Password, User};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A manager entry as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DirectoryManager {
    #[schema(example = "uid=jdoe,ou=People,dc=example,dc=com")]
    pub dn: String,
    #[schema(example = "jdoe")]
    pub login: String,
    #[schema(example = "John Doe")]
    pub name: String,
}

/// Directory operations used by the account views.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Directory: Send + Sync {
    /// Create the entry of an account under `unit` and return its DN.
    async fn add_user(&self, account: &User, password: &str, unit: Option<String>)
        -> AppResult<String>;

    /// Rewrite the entry of an account, replacing its password hash when given.
    ///
    /// The entry follows a changed login; its DN after the update is returned.
    async fn update_user(&self, account: &User, password: Option<String>) -> AppResult<String>;

    /// Remove the entry with the given DN.
    async fn delete_user(&self, dn: &str) -> AppResult<()>;

    /// Entries allowed to manage other accounts.
    async fn list_manager(&self) -> AppResult<Vec<DirectoryManager>>;

    /// Names of the organizational units directly under the base DN.
    async fn list_ou(&self) -> AppResult<Vec<String>>;

    /// Check a login/password pair by binding as the matching entry.
    async fn authenticate(&self, login: &str, password: &str) -> AppResult<bool>;
}

/// `ldap3` backed directory.
pub struct LdapDirectory {
    settings: LdapSettings,
}

impl LdapDirectory {
    pub fn new(settings: LdapSettings) -> Self {
        Self { settings }
    }

    /// Open a connection without binding.
    async fn open(&self) -> AppResult<Ldap> {
        let conn_settings = LdapConnSettings::new().set_no_tls_verify(!self.settings.tls_verify);
        let (conn, ldap) = LdapConnAsync::with_settings(conn_settings, &self.settings.url)
            .await
            .map_err(|e| AppError::directory(format!("LDAP connect failed: {e}")))?;

        ldap3::drive!(conn);
        Ok(ldap)
    }

    /// Open a connection bound as the service account.
    async fn connect(&self) -> AppResult<Ldap> {
        let mut ldap = self.open().await?;
        ldap.simple_bind(&self.settings.bind_dn, self.settings.bind_password())
            .await?
            .success()
            .map_err(|e| AppError::directory(format!("LDAP bind rejected: {e}")))?;

        debug!(server = %self.settings.url, "LDAP bind successful");
        Ok(ldap)
    }

    fn user_dn(&self, login: &str, unit: Option<&str>) -> String {
        let unit = unit.unwrap_or(&self.settings.users_ou);
        format!(
            "uid={},ou={},{}",
            dn_escape(login),
            dn_escape(unit),
            self.settings.base_dn
        )
    }

    /// DN and attributes of a new entry for `account`.
    fn new_entry(
        &self,
        account: &User,
        password: &str,
        unit: Option<&str>,
    ) -> AppResult<(String, Vec<(String, HashSet<String>)>)> {
        let dn = self.user_dn(&account.login, unit);
        let password_hash = Password::hash_for_directory(password)?;

        let mut attrs = account_attributes(account);
        attrs.push((
            "objectClass".to_string(),
            LDAP_USER_OBJECT_CLASSES.iter().map(|c| c.to_string()).collect(),
        ));
        attrs.push(("userPassword".to_string(), HashSet::from([password_hash])));
        Ok((dn, attrs))
    }

    async fn find_dn(&self, ldap: &mut Ldap, login: &str) -> AppResult<Option<String>> {
        let filter = format!("(&(objectClass=inetOrgPerson)(uid={}))", ldap_escape(login));
        let (entries, _) = ldap
            .search(&self.settings.base_dn, Scope::Subtree, &filter, vec!["uid"])
            .await?
            .success()?;

        Ok(entries
            .into_iter()
            .next()
            .map(|entry| SearchEntry::construct(entry).dn))
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn add_user(
        &self,
        account: &User,
        password: &str,
        unit: Option<String>,
    ) -> AppResult<String> {
        let (dn, attrs) = self.new_entry(account, password, unit.as_deref())?;

        let mut ldap = self.connect().await?;
        ldap.add(&dn, attrs)
            .await?
            .success()
            .map_err(|e| AppError::directory(format!("LDAP add user rejected: {e}")))?;

        info!(dn = %dn, login = %account.login, "Directory entry created");
        ldap.unbind().await.ok();
        Ok(dn)
    }

    async fn update_user(&self, account: &User, password: Option<String>) -> AppResult<String> {
        let current = account
            .dn
            .as_deref()
            .ok_or_else(|| AppError::directory(format!("{} has no directory entry", account.login)))?;

        let mut ldap = self.connect().await?;

        let dn = match renamed_dn(current, &account.login) {
            Some(renamed) => {
                let (rdn, _) = split_dn(&renamed);
                ldap.modifydn(current, rdn, true, None)
                    .await?
                    .success()
                    .map_err(|e| AppError::directory(format!("LDAP rename rejected: {e}")))?;
                info!(from = %current, to = %renamed, "Directory entry renamed");
                renamed
            }
            None => current.to_string(),
        };

        // uid names the entry, the rename above already set it
        let mut mods: Vec<Mod<String>> = account_attributes(account)
            .into_iter()
            .filter(|(attr, _)| attr != "uid")
            .map(|(attr, values)| Mod::Replace(attr, values))
            .collect();
        // Optional attributes left empty on the form are cleared
        for attr in ["givenName", "mail", "manager"] {
            if !mods.iter().any(|m| matches!(m, Mod::Replace(a, _) if a == attr)) {
                mods.push(Mod::Replace(attr.to_string(), HashSet::new()));
            }
        }
        if let Some(hash) = password {
            mods.push(Mod::Replace("userPassword".to_string(), HashSet::from([hash])));
        }

        ldap.modify(&dn, mods)
            .await?
            .success()
            .map_err(|e| AppError::directory(format!("LDAP modify rejected: {e}")))?;

        debug!(dn = %dn, "Directory entry updated");
        ldap.unbind().await.ok();
        Ok(dn)
    }

    async fn delete_user(&self, dn: &str) -> AppResult<()> {
        let mut ldap = self.connect().await?;
        ldap.delete(dn)
            .await?
            .success()
            .map_err(|e| AppError::directory(format!("LDAP delete rejected: {e}")))?;

        info!(dn = %dn, "Directory entry deleted");
        ldap.unbind().await.ok();
        Ok(())
    }

    async fn list_manager(&self) -> AppResult<Vec<DirectoryManager>> {
        let mut ldap = self.connect().await?;
        let (entries, _) = ldap
            .search(
                &self.settings.base_dn,
                Scope::Subtree,
                &self.settings.manager_filter,
                vec!["uid", "cn"],
            )
            .await?
            .success()?;
        ldap.unbind().await.ok();

        let mut managers: Vec<DirectoryManager> = entries
            .into_iter()
            .map(|entry| {
                let se = SearchEntry::construct(entry);
                let login = first_attr(&se, "uid");
                let name = match first_attr(&se, "cn") {
                    cn if cn.is_empty() => login.clone(),
                    cn => cn,
                };
                DirectoryManager {
                    dn: se.dn,
                    login,
                    name,
                }
            })
            .collect();
        managers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(managers)
    }

    async fn list_ou(&self) -> AppResult<Vec<String>> {
        let mut ldap = self.connect().await?;
        let (entries, _) = ldap
            .search(
                &self.settings.base_dn,
                Scope::OneLevel,
                "(objectClass=organizationalUnit)",
                vec!["ou"],
            )
            .await?
            .success()?;
        ldap.unbind().await.ok();

        let mut units: Vec<String> = entries
            .into_iter()
            .map(|entry| first_attr(&SearchEntry::construct(entry), "ou"))
            .filter(|ou| !ou.is_empty())
            .collect();
        units.sort();
        Ok(units)
    }

    async fn authenticate(&self, login: &str, password: &str) -> AppResult<bool> {
        // An empty password would turn the bind into an anonymous one
        if password.is_empty() {
            return Ok(false);
        }

        let mut service = self.connect().await?;
        let dn = self.find_dn(&mut service, login).await?;
        service.unbind().await.ok();

        let Some(dn) = dn else {
            debug!(login = %login, "No directory entry for login");
            return Ok(false);
        };

        let mut ldap = self.open().await?;
        let result = ldap.simple_bind(&dn, password).await?;
        ldap.unbind().await.ok();
        Ok(result.rc == 0)
    }
}

/// Attributes describing an account, without object classes or password.
fn account_attributes(account: &User) -> Vec<(String, HashSet<String>)> {
    let surname = if account.lastname.is_empty() {
        account.login.clone()
    } else {
        account.lastname.clone()
    };

    let mut attrs = vec![
        ("uid".to_string(), HashSet::from([account.login.clone()])),
        ("cn".to_string(), HashSet::from([account.name()])),
        ("sn".to_string(), HashSet::from([surname])),
    ];
    if !account.firstname.is_empty() {
        attrs.push(("givenName".to_string(), HashSet::from([account.firstname.clone()])));
    }
    if !account.email.is_empty() {
        attrs.push(("mail".to_string(), HashSet::from([account.email.clone()])));
    }
    if let Some(manager) = account.manager_dn.as_ref().filter(|dn| !dn.is_empty()) {
        attrs.push(("manager".to_string(), HashSet::from([manager.clone()])));
    }
    attrs
}

/// Split a DN into its leading RDN and the parent DN.
fn split_dn(dn: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in dn.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            ',' if !escaped => return (&dn[..i], &dn[i + 1..]),
            _ => escaped = false,
        }
    }
    (dn, "")
}

/// DN `current` takes once its entry is named after `login`, if that differs.
fn renamed_dn(current: &str, login: &str) -> Option<String> {
    let (rdn, parent) = split_dn(current);
    let wanted = format!("uid={}", dn_escape(login));
    if rdn == wanted {
        return None;
    }
    Some(if parent.is_empty() {
        wanted
    } else {
        format!("{},{}", wanted, parent)
    })
}

fn first_attr(entry: &SearchEntry, name: &str) -> String {
    entry
        .attrs
        .get(name)
        .and_then(|values| values.first())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> LdapDirectory {
        LdapDirectory::new(LdapSettings::default())
    }

    fn attr<'a>(attrs: &'a [(String, HashSet<String>)], name: &str) -> Option<&'a HashSet<String>> {
        attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[test]
    fn test_user_dn_defaults_to_users_unit() {
        assert_eq!(
            directory().user_dn("jdoe", None),
            "uid=jdoe,ou=People,dc=example,dc=com"
        );
    }

    #[test]
    fn test_user_dn_uses_given_unit_and_escapes() {
        let dn = directory().user_dn("doe,john", Some("Sales"));
        assert!(dn.starts_with("uid=doe\\"));
        assert!(!dn.contains("doe,john"));
        assert!(dn.ends_with(",ou=Sales,dc=example,dc=com"));
    }

    #[test]
    fn test_new_entry_accepts_any_directory_password() {
        let account = User::new("jdoe");

        for password in ["", "abc123"] {
            let (dn, attrs) = directory().new_entry(&account, password, None).unwrap();
            assert_eq!(dn, "uid=jdoe,ou=People,dc=example,dc=com");

            let hash = attr(&attrs, "userPassword").and_then(|v| v.iter().next()).unwrap();
            assert!(hash.starts_with("{ARGON2}$argon2"));
            assert!(Password::from_hash(hash.clone()).verify(password));
        }
    }

    #[test]
    fn test_renamed_dn_follows_login() {
        let dn = "uid=jdoe,ou=Sales,dc=example,dc=com";

        assert_eq!(renamed_dn(dn, "jdoe"), None);
        assert_eq!(
            renamed_dn(dn, "john"),
            Some("uid=john,ou=Sales,dc=example,dc=com".to_string())
        );
    }

    #[test]
    fn test_split_dn_skips_escaped_commas() {
        assert_eq!(
            split_dn("uid=doe\\,john,ou=People,dc=example,dc=com"),
            ("uid=doe\\,john", "ou=People,dc=example,dc=com")
        );
        assert_eq!(split_dn("dc=com"), ("dc=com", ""));
    }

    #[test]
    fn test_account_attributes_skip_empty_optionals() {
        let account = User::new("jdoe");
        let attrs = account_attributes(&account);

        assert_eq!(attr(&attrs, "sn"), Some(&HashSet::from(["jdoe".to_string()])));
        assert!(attr(&attrs, "givenName").is_none());
        assert!(attr(&attrs, "mail").is_none());
        assert!(attr(&attrs, "manager").is_none());
    }

    #[test]
    fn test_account_attributes_full() {
        let mut account = User::new("jdoe");
        account.firstname = "John".to_string();
        account.lastname = "Doe".to_string();
        account.email = "jdoe@example.com".to_string();
        account.manager_dn = Some("uid=boss,ou=People,dc=example,dc=com".to_string());

        let attrs = account_attributes(&account);
        assert_eq!(attr(&attrs, "cn"), Some(&HashSet::from(["John Doe".to_string()])));
        assert_eq!(attr(&attrs, "givenName"), Some(&HashSet::from(["John".to_string()])));
        assert_eq!(
            attr(&attrs, "manager"),
            Some(&HashSet::from(["uid=boss,ou=People,dc=example,dc=com".to_string()]))
        );
    }
}
