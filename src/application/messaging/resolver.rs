//! Participant resolution: who is on the other end of a thread.
//!
//! Lookup order is friends, then matches, then a directory fetch. A failed
//! fetch yields a placeholder so a thread list never waits on a name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::messaging::{other_party, Participant, ParticipantSource};
use crate::domain::social::Match;
use crate::domain::user::UserProfile;
use crate::ports::UserDirectory;

/// A resolved identity and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParticipant {
    pub participant: Participant,
    pub source: ParticipantSource,
}

/// Friends and matches already loaded by the session.
#[derive(Debug, Clone, Default)]
pub struct Contacts {
    pub friends: Vec<UserProfile>,
    pub matches: Vec<Match>,
}

impl Contacts {
    pub fn new(friends: Vec<UserProfile>, matches: Vec<Match>) -> Self {
        Self { friends, matches }
    }

    fn find(&self, user_id: &UserId) -> Option<(Participant, ParticipantSource)> {
        if let Some(friend) = self.friends.iter().find(|f| &f.id == user_id) {
            return Some((Participant::from(friend), ParticipantSource::Friend));
        }
        self.matches
            .iter()
            .find(|m| &m.user.id == user_id)
            .map(|m| (Participant::from(&m.user), ParticipantSource::Match))
    }
}

/// Stateless resolver. Callers memoize through [`ParticipantCache`].
#[derive(Clone)]
pub struct ParticipantResolver {
    directory: Arc<dyn UserDirectory>,
}

impl ParticipantResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Resolves the party of `participant_ids` that is not `current_user`.
    ///
    /// Returns `None` only when the thread has no participant ids at all.
    pub async fn resolve(
        &self,
        participant_ids: &[UserId],
        current_user: &UserId,
        contacts: &Contacts,
    ) -> Option<ResolvedParticipant> {
        let other = other_party(participant_ids, current_user)?;

        if let Some((participant, source)) = contacts.find(other) {
            return Some(ResolvedParticipant {
                participant,
                source,
            });
        }

        let resolved = match self.directory.fetch_user(other).await {
            Ok(profile) => ResolvedParticipant {
                participant: Participant::from(&profile),
                source: ParticipantSource::Directory,
            },
            Err(e) => {
                tracing::warn!(user_id = %other, error = %e, "participant lookup failed, using placeholder");
                ResolvedParticipant {
                    participant: Participant::placeholder(other.clone()),
                    source: ParticipantSource::Placeholder,
                }
            }
        };
        Some(resolved)
    }
}

/// Caller-side memo of resolved identities.
///
/// Placeholders are not cached, so a later call retries the lookup. All
/// methods except [`ParticipantCache::resolve`] are synchronous; callers
/// that share the cache behind a lock use [`ParticipantCache::cached`] and
/// [`ParticipantCache::remember`] around an unlocked resolver call.
#[derive(Debug, Default)]
pub struct ParticipantCache {
    entries: HashMap<UserId, ResolvedParticipant>,
}

impl ParticipantCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &UserId) -> Option<&Participant> {
        self.entries.get(user_id).map(|r| &r.participant)
    }

    /// Cached identity of the party of `participant_ids` that is not
    /// `current_user`.
    pub fn cached(&self, participant_ids: &[UserId], current_user: &UserId) -> Option<ResolvedParticipant> {
        let other = other_party(participant_ids, current_user)?;
        self.entries.get(other).cloned()
    }

    /// Stores a resolution unless it is a placeholder.
    pub fn remember(&mut self, resolved: &ResolvedParticipant) {
        if resolved.source != ParticipantSource::Placeholder {
            self.entries
                .insert(resolved.participant.id.clone(), resolved.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached lookup, falling back to `resolver`.
    pub async fn resolve(
        &mut self,
        resolver: &ParticipantResolver,
        participant_ids: &[UserId],
        current_user: &UserId,
        contacts: &Contacts,
    ) -> Option<ResolvedParticipant> {
        if let Some(cached) = self.cached(participant_ids, current_user) {
            return Some(cached);
        }

        let resolved = resolver
            .resolve(participant_ids, current_user, contacts)
            .await?;
        self.remember(&resolved);
        Some(resolved)
    }
}
