//! Paths under `/storage/v1`.

pub const AVATAR_BUCKET: &str = "avatars";

pub fn upload_path(bucket: &str, object: &str) -> String {
  format!("/storage/v1/object/{bucket}/{}", object.trim_start_matches('/'))
}

pub fn public_url(base_url: &str, bucket: &str, object: &str) -> String {
  format!(
    "{base_url}/storage/v1/object/public/{bucket}/{}",
    object.trim_start_matches('/')
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn avatar_urls() {
    assert_eq!(
      upload_path(AVATAR_BUCKET, "u1/avatar.png"),
      "/storage/v1/object/avatars/u1/avatar.png"
    );
    assert_eq!(
      public_url("https://x.supabase.co", AVATAR_BUCKET, "/u1/avatar.png"),
      "https://x.supabase.co/storage/v1/object/public/avatars/u1/avatar.png"
    );
  }
}
