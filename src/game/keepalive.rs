//! Respawn controller
//!
//! Keeps asking to be spawned while none of our cells are on the board,
//! backing off linearly between attempts.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::info;

use crate::game::cell::{own_cells, CommandSink, GameView};
use crate::game::constants::respawn::{NICKNAMES, RETRY_MS};

#[derive(Debug, Clone, Default)]
pub struct KeepAlive {
    try_num: u32,
    next_try: Option<Instant>,
    nickname: Option<String>,
}

impl KeepAlive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when a spawn request was sent this call
    pub fn update<G, S>(&mut self, now: Instant, game: &G, sink: &mut S) -> bool
    where
        G: GameView + ?Sized,
        S: CommandSink + ?Sized,
    {
        if !own_cells(game).is_empty() {
            if self.try_num != 0 {
                info!(
                    "Spawned as \"{}\" after {} attempt(s)",
                    self.nickname.as_deref().unwrap_or_default(),
                    self.try_num
                );
                *self = Self::default();
            }
            return false;
        }

        if self.next_try.is_some_and(|at| at > now) {
            return false;
        }

        let nickname = self.nickname.get_or_insert_with(random_nickname);
        info!("Trying to spawn as \"{}\"", nickname);
        sink.spawn(nickname.as_str());

        self.try_num += 1;
        self.next_try = Some(now + Duration::from_millis(RETRY_MS) * self.try_num);
        true
    }

    /// Spawn attempts since we were last alive
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.try_num
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }
}

fn random_nickname() -> String {
    let index = rand::thread_rng().gen_range(0..NICKNAMES.len());
    NICKNAMES[index].to_string()
}
