//! Keyword → fix lookup: a built-in layer compiled into the binary and a
//! user-editable dynamic layer persisted through a [`MapStore`].

use crate::error::{KnowledgeBaseError, StoreError};
use crate::store::{MapStore, MemoryStore, StoreMap};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Built-in keyword table for ATM / bank terminal logs, in lookup priority order
pub const BUILTIN_SOLUTIONS: &[(&str, &str)] = &[
    (
        "database connection failed",
        "Check your database connection settings and try again.",
    ),
    (
        "unable to connect to database",
        "Make sure the database server is running and try again.",
    ),
    (
        "timeout while loading user data",
        "Increase the timeout value and try again.",
    ),
    (
        "timeout occurred while fetching data",
        "Increase the timeout value and try again.",
    ),
    (
        "memory overload in module x",
        "Reduce the memory usage of module X and try again.",
    ),
    (
        "cassette 2 empty",
        "Refill cassette 2 with appropriate denomination notes and verify the cassette is correctly seated.",
    ),
    (
        "deposit slot jammed",
        "Check the deposit slot for any physical obstructions or misaligned envelopes and clear the jam.",
    ),
    (
        "unable to connect to core banking server",
        "Verify network connection between the E-Agent and the bank's core server. Restart router if necessary.",
    ),
    (
        "card reader failure",
        "Inspect and clean the card reader. If the problem persists, replace the card reader unit.",
    ),
    (
        "pin pad malfunction",
        "Reboot the machine. If issue continues, inspect the PIN pad connector or replace the unit.",
    ),
    (
        "printer paper empty",
        "Open the printer compartment and load a new roll of thermal paper.",
    ),
    (
        "cash dispenser motor error",
        "Check for jammed notes in the dispenser. Perform a dispenser test cycle through diagnostics mode.",
    ),
    (
        "network latency detected",
        "Monitor the connection stability. If ping times remain high, consider switching to a backup network route.",
    ),
    (
        "transaction timeout",
        "Check the backend server response time. Restart application services if necessary.",
    ),
    (
        "session expired unexpectedly",
        "Verify software timeout settings. Upgrade the firmware if an update is available.",
    ),
    (
        "card jammed in reader",
        "Manually remove the card if safe to do so, then reset the machine. Log incident if removal fails.",
    ),
    (
        "atm rebooted unexpectedly",
        "Check system logs for hardware or software faults. Perform a diagnostic check of hardware modules.",
    ),
    (
        "power supply interruption",
        "Verify power source and UPS status. Restore power and allow system to reboot fully.",
    ),
    (
        "camera malfunction",
        "Check the connection to the surveillance module. Replace camera if no feed is detected.",
    ),
    (
        "security module tampered",
        "Log a security alert. Alert branch supervisor and disable the ATM until physical inspection is completed.",
    ),
    (
        "door sensor triggered",
        "Check if ATM service door is properly closed. Re-secure door and reset the sensor alert.",
    ),
    (
        "vault temperature too high",
        "Inspect the ATM environment cooling. Allow cooldown before resuming operations.",
    ),
    (
        "card reader timeout",
        "Check reader module for response delay. Clean reader and restart the terminal.",
    ),
    (
        "host unreachable",
        "Verify bank host server status and connectivity. Escalate to network team if issue persists.",
    ),
    (
        "encryption key not found",
        "Reload the security keys via HSM or contact HQ to issue a new key injection command.",
    ),
    (
        "cassette 1 low",
        "Refill Cassette 1 with appropriate denomination before it runs out.",
    ),
    (
        "cassette 2 low",
        "Refill Cassette 2 with sufficient RM100 notes to avoid transaction disruption.",
    ),
    (
        "printer paper low",
        "Open the printer compartment and load a new roll of thermal paper.",
    ),
    (
        "high cpu usage detected",
        "Restart background services and monitor system performance. Upgrade if persistent.",
    ),
    (
        "unusual transaction volume",
        "Alert branch supervisor. Monitor for potential fraud or misconfiguration.",
    ),
    (
        "temperature nearing threshold",
        "Check air ventilation around the ATM. Reduce heat sources nearby.",
    ),
    (
        "battery backup low",
        "Inspect or replace the UPS unit to ensure reliable power during outages.",
    ),
    (
        "frequent pin entry failures",
        "Consider enabling temporary hold or increasing fraud alert sensitivity.",
    ),
    (
        "external device response delay",
        "Check USB or serial cable connections. Reboot attached modules.",
    ),
    (
        "surveillance camera signal weak",
        "Inspect camera wiring and lens. Clean and secure connections for better video feed.",
    ),
    (
        "cash dispenser jammed",
        "Open the dispenser tray and remove any jammed notes. Perform dispenser test in diagnostic mode.",
    ),
    (
        "cassette not recognized",
        "Ensure the cassette is properly seated. Reinsert or replace if not detected.",
    ),
    (
        "receipt printer failure",
        "Check for paper jams. Restart the printer or replace it if issue persists.",
    ),
    (
        "screen backlight failure",
        "Replace the ATM display unit or verify the power connection to the display.",
    ),
    (
        "card reader misaligned",
        "Realign the card reader or reseat its internal connector.",
    ),
    (
        "pin pad key stuck",
        "Inspect and clean the PIN pad. If hardware fault persists, replace the keypad unit.",
    ),
    (
        "atm unable to sync with hq",
        "Check WAN link connectivity. Restart router or VPN device.",
    ),
    (
        "host response delayed",
        "Check host system latency and verify if firewall or DNS is affecting requests.",
    ),
    (
        "network disconnected",
        "Verify LAN cable and switch port. Test with ping or traceroute.",
    ),
    (
        "ssl handshake failed",
        "Ensure the ATM system time is correct and SSL certificates are not expired.",
    ),
    (
        "dns resolution failed",
        "Update DNS settings or switch to a backup DNS (e.g., 8.8.8.8).",
    ),
    (
        "ftp transfer failed",
        "Check FTP server availability and credentials. Retry file sync.",
    ),
    (
        "encryption module not initialized",
        "Initialize the HSM or crypto module and perform a secure key injection.",
    ),
    (
        "camera feed lost",
        "Verify physical connection to DVR or IP feed. Reboot the camera if required.",
    ),
    (
        "tamper switch triggered",
        "Verify ATM case has not been opened. Reset tamper state after inspection.",
    ),
    (
        "safe door left open",
        "Ensure vault door is securely closed and locked. Reset the door sensor.",
    ),
    (
        "security alert - intrusion detected",
        "Disable ATM temporarily. Inform branch security and perform physical check.",
    ),
    (
        "bootloader failed",
        "Reflash the ATM bootloader using vendor software. Check for corrupted firmware.",
    ),
    (
        "application not responding",
        "Restart ATM services. If the issue persists, reinstall core ATM software.",
    ),
    (
        "update failed - rollback initiated",
        "Check software version compatibility. Clear cache and retry update.",
    ),
    (
        "config file missing",
        "Restore default config file from backup. Avoid hard shutdowns during config edits.",
    ),
    (
        "service daemon not running",
        "Start the daemon manually or set it to auto-start on boot.",
    ),
    (
        "ups battery critically low",
        "Replace UPS battery or verify UPS is charging correctly.",
    ),
    (
        "power surge detected",
        "Inspect power regulation module. Install surge protection if absent.",
    ),
    (
        "fan malfunction detected",
        "Clean internal fans. Replace any fan not spinning during diagnostics.",
    ),
    (
        "internal temperature exceeded",
        "Shut down ATM temporarily. Improve ventilation or air conditioning.",
    ),
    (
        "humidity sensor alert",
        "Check for water leak or excess humidity. Use dehumidifier if needed.",
    ),
    (
        "no internet connection",
        "Check network connectivity and DNS settings. Reboot router or VPN device.",
    ),
    (
        "dns resolution issue",
        "Update DNS settings or switch to a backup DNS (e.g., 8.8.8.8).",
    ),
    (
        "ftp transfer issue",
        "Check FTP server availability and credentials. Retry file sync.",
    ),
    (
        "looks like the active ej is not growing. no transactions, perhaps?",
        "Check if the ATM is idle or has not processed any transactions recently. Verify the network connectivity, transaction routing, and the status of ATM services. If the machine is live but inactive, this message is normal. If unexpected, check the transaction logs, EJ pointer, and restart the transaction service if needed.",
    ),
    (
        "error occured while closing jms session:",
        "Check if the JMS session is not null and not already closed before calling session.close() inside a try-catch block.",
    ),
    (
        "error occured while closing jms producer:",
        "Check if the JMS producer is not null and not already closed before calling producer.close() inside a try-catch block.",
    ),
];

/// A keyword hit from [`KnowledgeBase::find`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeMatch {
    pub keyword: String,
    pub solution: String,
}

#[derive(Debug, Clone)]
struct KeywordEntry {
    keyword: String,
    lowered: String,
    solution: String,
}

/// Frozen copy of the merged keyword list.
///
/// Cheap to clone. Writes to the knowledge base after the snapshot was taken
/// are not visible through it.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: Arc<Vec<KeywordEntry>>,
}

impl KeywordIndex {
    /// First keyword contained in `message`, compared case-insensitively
    pub fn find(&self, message: &str) -> Option<KnowledgeMatch> {
        let lowered = message.to_lowercase();
        self.entries
            .iter()
            .find(|entry| lowered.contains(&entry.lowered))
            .map(|entry| KnowledgeMatch {
                keyword: entry.keyword.clone(),
                solution: entry.solution.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
struct Layers {
    dynamic: StoreMap,
    merged: KeywordIndex,
}

impl Layers {
    fn new(builtin: &StoreMap, dynamic: StoreMap) -> Self {
        let mut combined = builtin.clone();
        for (key, solution) in &dynamic {
            // Overriding keeps the existing key's position
            combined.insert(key.clone(), solution.clone());
        }

        let merged = combined
            .into_iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .map(|(keyword, solution)| KeywordEntry {
                lowered: keyword.to_lowercase(),
                keyword,
                solution,
            })
            .collect();

        Self {
            dynamic,
            merged: KeywordIndex {
                entries: Arc::new(merged),
            },
        }
    }
}

/// Merged knowledge base.
///
/// Lookup is first-inserted-wins: built-in keywords in table order, then
/// dynamic keywords in file order. Mutations touch only the dynamic layer and
/// are persisted before the in-memory view changes; a failed write leaves the
/// view as it was.
pub struct KnowledgeBase {
    builtin: StoreMap,
    state: RwLock<Layers>,
    store: Box<dyn MapStore>,
}

impl KnowledgeBase {
    /// Built-in table plus whatever `store` currently holds. An unreadable
    /// store is treated as empty.
    pub fn open(store: Box<dyn MapStore>) -> Self {
        Self::with_layers(builtin_map(), store)
    }

    pub fn with_layers(builtin: StoreMap, store: Box<dyn MapStore>) -> Self {
        let dynamic = match store.load() {
            Ok(map) => map,
            Err(e) => {
                warn!(store = %store.describe(), error = %e, "knowledge base unreadable, starting with an empty dynamic layer");
                StoreMap::new()
            }
        };
        let state = RwLock::new(Layers::new(&builtin, dynamic));
        Self { builtin, state, store }
    }

    /// Built-in table with a non-persistent dynamic layer
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStore::new()))
    }

    /// First keyword contained in `message`, compared case-insensitively
    pub fn find(&self, message: &str) -> Option<KnowledgeMatch> {
        self.state.read().merged.find(message)
    }

    /// The merged view as it is now
    pub fn snapshot(&self) -> KeywordIndex {
        self.state.read().merged.clone()
    }

    /// Create a dynamic entry. Fails if the key already exists in the dynamic layer.
    pub fn add(&self, key: &str, solution: &str) -> Result<(), KnowledgeBaseError> {
        let (key, solution) = validate(key, solution)?;
        let mut duplicate = false;
        let map = self.store.modify(&mut |map: &mut StoreMap| {
            if map.contains_key(&key) {
                duplicate = true;
                return false;
            }
            map.insert(key.clone(), solution.clone());
            true
        })?;

        if duplicate {
            self.replace_dynamic(map);
            return Err(KnowledgeBaseError::DuplicateEntry { key });
        }

        info!(key = %key, store = %self.store.describe(), "knowledge base entry added");
        self.replace_dynamic(map);
        Ok(())
    }

    /// Create or replace a dynamic entry
    pub fn upsert(&self, key: &str, solution: &str) -> Result<(), KnowledgeBaseError> {
        let (key, solution) = validate(key, solution)?;
        let map = self.store.modify(&mut |map: &mut StoreMap| {
            if map.get(&key) == Some(&solution) {
                return false;
            }
            map.insert(key.clone(), solution.clone());
            true
        })?;

        info!(key = %key, store = %self.store.describe(), "knowledge base entry saved");
        self.replace_dynamic(map);
        Ok(())
    }

    /// Remove a dynamic entry, reporting whether it existed. Built-in keys cannot be deleted.
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let key = key.trim();
        let mut existed = false;
        let map = self.store.modify(&mut |map: &mut StoreMap| {
            existed = map.shift_remove(key).is_some();
            existed
        })?;

        if existed {
            info!(key = %key, store = %self.store.describe(), "knowledge base entry deleted");
        }
        self.replace_dynamic(map);
        Ok(existed)
    }

    /// Dynamic layer in file order
    pub fn dynamic_entries(&self) -> Vec<(String, String)> {
        self.state
            .read()
            .dynamic
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Dynamic layer sorted by key
    pub fn entries_sorted(&self) -> Vec<(String, String)> {
        let mut entries = self.dynamic_entries();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Dynamic entries whose key or solution contains `query`, case-insensitively, sorted by key
    pub fn search(&self, query: &str) -> Vec<(String, String)> {
        let query = query.trim().to_lowercase();
        self.entries_sorted()
            .into_iter()
            .filter(|(key, solution)| {
                query.is_empty()
                    || key.to_lowercase().contains(&query)
                    || solution.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Number of keywords in the merged view
    pub fn len(&self) -> usize {
        self.state.read().merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    fn replace_dynamic(&self, dynamic: StoreMap) {
        let mut state = self.state.write();
        *state = Layers::new(&self.builtin, dynamic);
    }
}

/// The built-in table as an ordered map
pub fn builtin_map() -> StoreMap {
    BUILTIN_SOLUTIONS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn validate(key: &str, solution: &str) -> Result<(String, String), KnowledgeBaseError> {
    let key = key.trim();
    let solution = solution.trim();
    if key.is_empty() {
        return Err(KnowledgeBaseError::EmptyField { field: "key" });
    }
    if solution.is_empty() {
        return Err(KnowledgeBaseError::EmptyField { field: "solution" });
    }
    Ok((key.to_string(), solution.to_string()))
}
