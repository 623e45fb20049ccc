use crate::node::CacheKeyDeriver;

/// Per-second counter keys covering one sliding window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowKeys {
    /// Local-origin operation counters, newest second first
    pub local: Vec<String>,
    /// Peer-origin operation counters, newest second first
    pub peer: Vec<String>,
}

/// Counter keys for the `window_seconds` seconds ending one second before `now_epoch_seconds`
///
/// The current second is still being counted, so the window starts at
/// `now - 1` and ends at `now - window_seconds`.
pub fn derive_window_keys(
    keys: &dyn CacheKeyDeriver,
    ledger_node_id: &str,
    window_seconds: u32,
    now_epoch_seconds: i64,
) -> WindowKeys {
    let size = window_seconds as usize;
    let mut window = WindowKeys {
        local: Vec::with_capacity(size),
        peer: Vec::with_capacity(size),
    };
    for offset in 1..=i64::from(window_seconds) {
        let second = now_epoch_seconds - offset;
        window.local.push(keys.op_count_local(ledger_node_id, second));
        window.peer.push(keys.op_count_peer(ledger_node_id, second));
    }
    window
}
