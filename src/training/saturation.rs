use log::warn;

const EPSILON: f64 = 1e-9;
const PATIENCE: usize = 9;

/// Warns when a layer keeps taking steps too small to change its parameters.
#[derive(Debug, Clone, Default)]
pub(crate) struct SaturationMonitor {
    stalls: Vec<usize>,
}

impl SaturationMonitor {
    /// Records the size of the last step taken by a layer.
    ///
    /// # Arguments
    /// * `layer` - The index of the layer in its network.
    /// * `step` - The largest absolute change applied to any of its parameters.
    ///
    /// # Returns
    /// Whether a saturation warning was emitted.
    pub(crate) fn observe(&mut self, layer: usize, step: f64) -> bool {
        if layer >= self.stalls.len() {
            self.stalls.resize(layer + 1, 0);
        }

        let stalls = &mut self.stalls[layer];
        if step > EPSILON {
            *stalls = 0;
            return false;
        }

        *stalls += 1;
        if *stalls <= PATIENCE {
            return false;
        }

        warn!("possible saturation in layer {layer}: {} updates without change", *stalls);
        *stalls = 0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warns_after_ten_stalled_updates() {
        let mut monitor = SaturationMonitor::default();

        for _ in 0..PATIENCE {
            assert!(!monitor.observe(1, 0.));
        }
        assert!(monitor.observe(1, 0.));

        // the counter starts over after a warning
        assert!(!monitor.observe(1, 0.));
    }

    #[test]
    fn real_steps_reset_the_count() {
        let mut monitor = SaturationMonitor::default();

        for _ in 0..PATIENCE {
            monitor.observe(0, 1e-12);
        }
        assert!(!monitor.observe(0, 0.5));
        for _ in 0..PATIENCE {
            assert!(!monitor.observe(0, 0.));
        }
    }

    #[test]
    fn layers_are_tracked_separately() {
        let mut monitor = SaturationMonitor::default();

        for _ in 0..PATIENCE {
            monitor.observe(0, 0.);
            monitor.observe(2, 1.);
        }
        assert!(!monitor.observe(2, 0.));
        assert!(monitor.observe(0, 0.));
    }
}
