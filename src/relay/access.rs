//! Identity sets and the access precedence they imply.
//!
//! Three non-exclusive sets classify every user id: admins (static, from
//! configuration), verified (grows only, via the challenge), and banned
//! (grows and shrinks, via admin commands). Admins bypass both the verified
//! and banned checks entirely; ban and verification are no-ops for them in
//! effect. Precedence for ordinary users: banned wins over verified.
//!
//! No validation that an id denotes a real account; ban/unban accept any
//! integer, mirroring how moderation normally works against raw ids.

use std::collections::HashSet;

#[derive(Debug)]
pub struct AccessControl {
    admins: HashSet<i64>,
    verified: HashSet<i64>,
    banned: HashSet<i64>,
}

impl AccessControl {
    pub fn new(admin_ids: &[i64]) -> Self {
        AccessControl {
            admins: admin_ids.iter().copied().collect(),
            verified: HashSet::new(),
            banned: HashSet::new(),
        }
    }

    pub fn is_admin(&self, id: i64) -> bool {
        self.admins.contains(&id)
    }

    pub fn is_verified(&self, id: i64) -> bool {
        self.verified.contains(&id)
    }

    pub fn is_banned(&self, id: i64) -> bool {
        self.banned.contains(&id)
    }

    /// Idempotent add to the verified set.
    pub fn verify(&mut self, id: i64) {
        self.verified.insert(id);
    }

    /// Idempotent add to the banned set.
    pub fn ban(&mut self, id: i64) {
        self.banned.insert(id);
    }

    /// Idempotent remove from the banned set.
    pub fn unban(&mut self, id: i64) {
        self.banned.remove(&id);
    }

    /// Admin ids, sorted for deterministic notification order.
    pub fn admins(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.admins.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Verified ids, sorted for stable listing.
    pub fn verified_users(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.verified.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
