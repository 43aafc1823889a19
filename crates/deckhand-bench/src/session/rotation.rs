/// Cycles agents through the seats so every agent sits in every position.
/// Session `i` puts agent `(seat + i) % n` in `seat`.
pub struct SeatRotation {
    agents: usize,
}

impl SeatRotation {
    pub fn new(agents: usize) -> Self {
        Self { agents }
    }

    pub fn len(&self) -> usize {
        self.agents
    }

    pub fn is_empty(&self) -> bool {
        self.agents == 0
    }

    /// Agent index for each seat in session `session`.
    pub fn seating(&self, session: usize) -> Vec<usize> {
        if self.agents == 0 {
            return Vec::new();
        }
        let offset = session % self.agents;
        (0..self.agents)
            .map(|seat| (seat + offset) % self.agents)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_session_keeps_config_order() {
        assert_eq!(SeatRotation::new(3).seating(0), vec![0, 1, 2]);
    }

    #[test]
    fn every_agent_visits_every_seat() {
        let rotation = SeatRotation::new(4);
        for agent in 0..4 {
            let mut seats: Vec<usize> = (0..4)
                .map(|session| {
                    rotation
                        .seating(session)
                        .iter()
                        .position(|&a| a == agent)
                        .expect("agent seated")
                })
                .collect();
            seats.sort();
            assert_eq!(seats, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn rotation_repeats_after_a_full_cycle() {
        let rotation = SeatRotation::new(3);
        assert_eq!(rotation.seating(1), rotation.seating(4));
        assert_eq!(rotation.seating(1), vec![1, 2, 0]);
    }
}
