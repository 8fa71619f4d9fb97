use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use super::{SessionSigner, TokenGenerator};
use crate::access::{self, archive};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Actor, LinkShare, Permission, SharingType};

const SHARE_HASH_LENGTH: usize = 40;

/// Request to create a link share on a project.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLinkShare {
    pub project_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub permission: Permission,
    pub sharing_type: SharingType,
    #[serde(default)]
    pub password: Option<String>,
}

/// A freshly issued share. `hash` is the value a guest presents to
/// authenticate.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedLinkShare {
    pub hash: String,
    pub share: LinkShare,
}

fn generate_hash() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_HASH_LENGTH)
        .map(char::from)
        .collect()
}

/// Checks that `actor` may create or remove a share of level `permission`
/// on `project_id`: admin shares need admin, anything else needs write, and
/// the project must not be archived-effective.
fn authorize_share_management<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    permission: Permission,
) -> Result<()> {
    if actor.is_link_share() {
        tracing::debug!(
            actor = actor.virtual_id(),
            project_id,
            "Link share actors cannot manage shares"
        );
        return Err(Error::Forbidden);
    }

    let access = if permission == Permission::Admin {
        access::require_admin(store, actor, project_id)?
    } else {
        access::require_write(store, actor, project_id)?
    };
    archive::ensure_not_archived(&access.project, &access.ancestors)
}

pub fn issue<S: Store + ?Sized>(store: &S, actor: &Actor, new: NewLinkShare) -> Result<IssuedLinkShare> {
    authorize_share_management(store, actor, new.project_id, new.permission)?;
    let user = actor.user().ok_or(Error::Forbidden)?;

    let password_hash = match new.sharing_type {
        SharingType::WithPassword => {
            let password = new
                .password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or(Error::LinkSharePasswordRequired)?;
            Some(TokenGenerator::new().hash(password)?)
        }
        SharingType::WithoutPassword => None,
    };

    let now = Utc::now();
    let mut share = LinkShare {
        id: 0,
        hash: generate_hash(),
        name: new.name,
        project_id: new.project_id,
        permission: new.permission,
        sharing_type: new.sharing_type,
        password_hash,
        shared_by_id: user.id,
        created_at: now,
        updated_at: now,
    };
    share.id = store.create_link_share(&share)?;
    share.password_hash = None;

    tracing::info!(
        share_id = share.id,
        project_id = share.project_id,
        permission = share.permission.as_str(),
        "Issued link share"
    );

    Ok(IssuedLinkShare {
        hash: share.hash.clone(),
        share,
    })
}

/// Exchanges a share hash (and password, for protected shares) for a
/// link-share actor and a signed bearer token.
pub fn authenticate<S: Store + ?Sized>(
    store: &S,
    signer: &dyn SessionSigner,
    hash: &str,
    password: Option<&str>,
) -> Result<(Actor, String)> {
    let share = store
        .get_link_share_by_hash(hash)?
        .ok_or(Error::LinkShareNotFound)?;

    if share.sharing_type == SharingType::WithPassword {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(Error::LinkSharePasswordRequired)?;
        let stored = share.password_hash.as_deref().ok_or_else(|| {
            tracing::error!(share_id = share.id, "Password share has no stored hash");
            Error::LinkSharePasswordInvalid
        })?;
        if !TokenGenerator::new().verify(password, stored)? {
            tracing::debug!(share_id = share.id, "Link share password mismatch");
            return Err(Error::LinkSharePasswordInvalid);
        }
    }

    let token = signer.issue(&share)?;
    let actor = Actor::LinkShare {
        share_id: share.id,
        project_id: share.project_id,
        permission: share.permission,
    };

    tracing::debug!(share_id = share.id, project_id = share.project_id, "Link share authenticated");
    Ok((actor, token))
}

/// Lists the shares of a project. Requires read; link-share actors are refused.
pub fn list<S: Store + ?Sized>(store: &S, actor: &Actor, project_id: i64) -> Result<Vec<LinkShare>> {
    if actor.is_link_share() {
        return Err(Error::Forbidden);
    }
    access::require_read(store, actor, project_id)?;
    store.list_project_link_shares(project_id)
}

/// Deletes a share, under the same rule that governs issuing it.
pub fn delete<S: Store + ?Sized>(
    store: &S,
    actor: &Actor,
    project_id: i64,
    share_id: i64,
) -> Result<()> {
    let share = store
        .get_link_share(share_id)?
        .filter(|s| s.project_id == project_id)
        .ok_or(Error::LinkShareNotFound)?;

    authorize_share_management(store, actor, project_id, share.permission)?;
    store.delete_link_share(share_id)?;

    tracing::info!(share_id, project_id, "Deleted link share");
    Ok(())
}
