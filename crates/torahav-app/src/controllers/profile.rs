//! The profile page.
//!
//! Saving is two independent steps: an optional avatar upload (upsert, so
//! it can be repeated) followed by a single profile update. If the update
//! fails after a successful upload, the chosen avatar stays on the form and
//! the next save uploads it again.

use std::sync::Arc;

use bytes::Bytes;
use torahav_core::{
  gateway::Gateway,
  model::{Blob, Profile, ProfileUpdate},
  route::Route,
};
use tracing::{error, info};
use uuid::Uuid;

use super::Outcome;
use crate::{messages, session::SessionStore};

/// An avatar image picked by the user but not yet saved.
#[derive(Debug, Clone)]
pub struct AvatarFile {
  pub file_name: String,
  pub blob:      Blob,
}

impl AvatarFile {
  /// Guess the content type from the file name's extension.
  pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
    let file_name = file_name.into();
    let content_type = content_type_for(extension(&file_name)).to_owned();
    Self {
      file_name,
      blob: Blob { data: data.into(), content_type },
    }
  }
}

/// Success and failure are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
  Success(String),
  Error(String),
}

pub struct ProfileForm<G: Gateway> {
  session:          Arc<SessionStore<G>>,
  pub profile:      Option<Profile>,
  pub display_name: String,
  pub bio:          String,
  pub avatar:       Option<AvatarFile>,
  pub banner:       Option<Banner>,
  pub loading:      bool,
  pub saving:       bool,
}

impl<G: Gateway> ProfileForm<G> {
  pub fn new(session: Arc<SessionStore<G>>) -> Self {
    Self {
      session,
      profile: None,
      display_name: String::new(),
      bio: String::new(),
      avatar: None,
      banner: None,
      loading: false,
      saving: false,
    }
  }

  /// Load the signed-in user's profile into the form.
  pub async fn load(&mut self) -> Outcome {
    if !self.session.is_authenticated() {
      return Outcome::Navigate(Route::Login);
    }
    self.loading = true;
    match self.session.profile().await {
      Ok(Some(profile)) => {
        self.display_name = profile.display_name.clone();
        self.bio = profile.bio.clone().unwrap_or_default();
        self.profile = Some(profile);
      }
      Ok(None) => {}
      Err(e) => error!("failed to load profile: {e}"),
    }
    self.loading = false;
    Outcome::Stay
  }

  pub async fn submit(&mut self) -> Outcome {
    let Some(profile) = self.profile.clone() else {
      return Outcome::Navigate(Route::Login);
    };
    self.banner = None;
    self.saving = true;
    let result = self.save(&profile).await;
    self.saving = false;

    match result {
      Ok(avatar_url) => {
        info!(user_id = %profile.id, "profile updated");
        self.profile = Some(Profile {
          display_name: self.display_name.clone(),
          bio: Some(self.bio.clone()),
          avatar_url,
          ..profile
        });
        self.avatar = None;
        self.banner = Some(Banner::Success(messages::PROFILE_UPDATED.to_owned()));
      }
      Err(e) => {
        error!(user_id = %profile.id, "failed to update profile: {e}");
        self.banner = Some(Banner::Error(messages::PROFILE_UPDATE_FAILED.to_owned()));
      }
    }
    Outcome::Stay
  }

  /// Upload the pending avatar (if any), then write the profile row.
  /// Returns the avatar URL now stored.
  async fn save(&self, profile: &Profile) -> Result<Option<String>, G::Error> {
    let gateway = self.session.gateway();
    let mut avatar_url = profile.avatar_url.clone();

    if let Some(avatar) = &self.avatar {
      let path = avatar_path(profile.id, &avatar.file_name);
      gateway.upload_avatar(path.clone(), avatar.blob.clone(), true).await?;
      avatar_url = Some(gateway.avatar_public_url(&path));
    }

    let update = ProfileUpdate {
      display_name: self.display_name.clone(),
      bio:          self.bio.clone(),
      avatar_url:   avatar_url.clone(),
    };
    gateway.update_profile(profile.id, update).await?;
    Ok(avatar_url)
  }
}

/// `<user_id>/avatar.<ext>`, where `<ext>` is whatever follows the last `.`
/// of the file name (the whole name if it has none).
pub fn avatar_path(user_id: Uuid, file_name: &str) -> String {
  format!("{user_id}/avatar.{}", extension(file_name))
}

fn extension(file_name: &str) -> &str { file_name.rsplit('.').next().unwrap_or(file_name) }

fn content_type_for(ext: &str) -> &'static str {
  match ext.to_ascii_lowercase().as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "svg" => "image/svg+xml",
    _ => "application/octet-stream",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn avatar_path_uses_last_extension() {
    let id = Uuid::nil();
    assert_eq!(
      avatar_path(id, "me.final.PNG"),
      "00000000-0000-0000-0000-000000000000/avatar.PNG"
    );
    assert_eq!(
      avatar_path(id, "portrait"),
      "00000000-0000-0000-0000-000000000000/avatar.portrait"
    );
  }

  #[test]
  fn content_type_follows_extension() {
    assert_eq!(AvatarFile::new("me.JPG", Vec::new()).blob.content_type, "image/jpeg");
    assert_eq!(
      AvatarFile::new("me.bin", Vec::new()).blob.content_type,
      "application/octet-stream"
    );
  }
}
