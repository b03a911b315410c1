//! Profile registry with initialization on first use.
//!
//! # Responsibilities
//! - Hold every registered `ClientProfile`
//! - Build one `reqwest::Client` per profile, on first `get`
//! - Hand the same cached client to every later caller
//!
//! Each profile owns its own `OnceCell`. Concurrent callers for the same
//! profile wait for the first build; a failed build leaves the slot empty so
//! the next caller tries again. Callers for different profiles never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::client::connect::ConnectEvents;
use crate::client::profile::{ClientProfile, TimeoutBudget};
use crate::error::{HarnessError, HarnessResult};

/// An HTTP client bound to one profile's budgets.
///
/// reqwest enforces the connect budget. The read and write budgets are
/// enforced per chunk by the gateway, because reqwest has no write timeout and
/// its read timeout cannot tell a slow server from a deliberately slow reader.
/// The gateway starts those budgets only once `connect_events` reports the
/// connection is up.
#[derive(Debug)]
pub struct HarnessClient {
    profile: ClientProfile,
    http: reqwest::Client,
    connects: ConnectEvents,
}

impl HarnessClient {
    fn build(profile: &ClientProfile) -> Result<Self, reqwest::Error> {
        let connects = ConnectEvents::new();
        let http = reqwest::Client::builder()
            .connector_layer(connects.layer())
            .connect_timeout(profile.budget.connect)
            .pool_max_idle_per_host(0)
            .no_proxy()
            .user_agent(concat!("timeout-harness/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            profile: profile.clone(),
            http,
            connects,
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn budget(&self) -> TimeoutBudget {
        self.profile.budget
    }

    pub fn profile_name(&self) -> &str {
        &self.profile.name
    }

    /// Connection notifications for this client. Clients keep no idle
    /// connections, so each request made through one dials afresh.
    pub fn connect_events(&self) -> &ConnectEvents {
        &self.connects
    }
}

struct ProfileSlot {
    profile: ClientProfile,
    client: OnceCell<Arc<HarnessClient>>,
}

/// Named profiles plus their lazily built clients.
pub struct ProfileRegistry {
    slots: HashMap<String, ProfileSlot>,
}

impl ProfileRegistry {
    /// Register profiles. A later profile with the same name replaces an earlier one.
    pub fn new(profiles: impl IntoIterator<Item = ClientProfile>) -> HarnessResult<Self> {
        let mut slots = HashMap::new();
        for profile in profiles {
            if let Some(field) = profile.budget.zero_field() {
                return Err(HarnessError::InvalidProfile {
                    name: profile.name,
                    reason: format!("{} budget must be greater than zero", field),
                });
            }
            slots.insert(
                profile.name.clone(),
                ProfileSlot {
                    profile,
                    client: OnceCell::new(),
                },
            );
        }
        Ok(Self { slots })
    }

    /// Registry holding only the built-in profiles.
    pub fn builtin() -> Self {
        let slots = ClientProfile::builtin()
            .into_iter()
            .map(|profile| {
                (
                    profile.name.clone(),
                    ProfileSlot {
                        profile,
                        client: OnceCell::new(),
                    },
                )
            })
            .collect();
        Self { slots }
    }

    /// Profile definition, without building a client.
    pub fn profile(&self, name: &str) -> HarnessResult<&ClientProfile> {
        self.slots
            .get(name)
            .map(|slot| &slot.profile)
            .ok_or_else(|| HarnessError::UnknownProfile(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Registered profiles, sorted by name.
    pub fn profiles(&self) -> Vec<&ClientProfile> {
        let mut profiles: Vec<_> = self.slots.values().map(|slot| &slot.profile).collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }

    /// Whether the client for `name` has been built yet.
    pub fn is_materialized(&self, name: &str) -> bool {
        self.slots
            .get(name)
            .is_some_and(|slot| slot.client.initialized())
    }

    /// Client for `name`, building it on first use.
    pub async fn get(&self, name: &str) -> HarnessResult<Arc<HarnessClient>> {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| HarnessError::UnknownProfile(name.to_string()))?;

        let client = slot
            .client
            .get_or_try_init(|| async {
                let client = HarnessClient::build(&slot.profile).map_err(|source| {
                    HarnessError::ClientBuild {
                        profile: slot.profile.name.clone(),
                        source,
                    }
                })?;
                tracing::debug!(
                    profile = %slot.profile.name,
                    connect = ?slot.profile.budget.connect,
                    read = ?slot.profile.budget.read,
                    write = ?slot.profile.budget.write,
                    "HTTP client built"
                );
                Ok::<_, HarnessError>(Arc::new(client))
            })
            .await?;

        Ok(Arc::clone(client))
    }
}
