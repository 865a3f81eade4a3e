//! AFK detection over a live server snapshot.

/// A player connected to a live server.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlinePlayer {
    pub name: String,
    /// Squad the player belongs to; `None` means unassigned.
    pub squad_id: Option<String>,
    /// Seconds connected in the current session, when the server reports it.
    pub session_seconds: Option<f64>,
    pub score: i64,
}

impl OnlinePlayer {
    pub const fn is_afk(&self) -> bool {
        self.squad_id.is_none()
    }

    /// Whole minutes in the current session, 0 when unknown.
    #[allow(clippy::cast_possible_truncation)]
    pub fn session_minutes(&self) -> i64 {
        self.session_seconds
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
            .map_or(0, |seconds| (seconds / 60.0).floor() as i64)
    }
}

/// Players without a squad, in snapshot order.
pub fn find_afk(players: &[OnlinePlayer]) -> Vec<&OnlinePlayer> {
    players.iter().filter(|player| player.is_afk()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, squad_id: Option<&str>, session_seconds: Option<f64>) -> OnlinePlayer {
        OnlinePlayer {
            name: name.to_string(),
            squad_id: squad_id.map(String::from),
            session_seconds,
            score: 0,
        }
    }

    #[test]
    fn find_afk_keeps_unassigned_players_in_order() {
        let players = vec![
            player("squadded", Some("3"), Some(600.0)),
            player("lurker", None, Some(1_200.0)),
            player("newcomer", None, None),
        ];

        let names: Vec<_> = find_afk(&players)
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["lurker", "newcomer"]);
    }

    #[test]
    fn session_minutes_floors() {
        assert_eq!(player("a", None, Some(119.9)).session_minutes(), 1);
        assert_eq!(player("a", None, Some(120.0)).session_minutes(), 2);
    }

    #[test]
    fn session_minutes_defaults_to_zero() {
        assert_eq!(player("a", None, None).session_minutes(), 0);
        assert_eq!(player("a", None, Some(f64::NAN)).session_minutes(), 0);
    }
}
