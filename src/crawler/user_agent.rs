use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Browser User-Agent strings rotated across requests
pub const USER_AGENT_POOL: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
];

/// Picks a User-Agent from the pool using `rng`
pub fn choose_user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    USER_AGENT_POOL[rng.random_range(0..USER_AGENT_POOL.len())]
}

/// Thread-safe User-Agent source shared by all fetch tasks
///
/// The random source is injectable so tests can use a fixed seed.
#[derive(Debug)]
pub struct UserAgentPicker {
    rng: Mutex<StdRng>,
}

impl UserAgentPicker {
    /// Creates a picker seeded from the operating system
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Creates a deterministic picker
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn pick(&self) -> &'static str {
        // A poisoned lock still holds a usable RNG
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        choose_user_agent(&mut *rng)
    }
}

impl Default for UserAgentPicker {
    fn default() -> Self {
        Self::new()
    }
}
