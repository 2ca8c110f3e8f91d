//! ControlPlaneQueueManager implementation.

use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use swagent_hal::{Gport, StreamType, SwitchHal};

use super::types::{
    CosqError, PortQueueConfig, QueueCounterType, QueueSettings, CPU_QUEUE_COUNTER_TYPES,
};

/// Tracks the CPU port's egress queues.
///
/// The CPU port only has multicast queues. Their gports are resolved once at
/// construction and served from the cache afterwards.
pub struct ControlPlaneQueueManager {
    cos_supported: bool,
    multicast_gports: Vec<Gport>,
    configured: HashMap<(StreamType, u8), QueueSettings>,
}

impl ControlPlaneQueueManager {
    /// Resolves the CPU queue gports and indexes the configured settings.
    pub fn new(hal: Arc<dyn SwitchHal>, settings: &[QueueSettings]) -> Result<Self, CosqError> {
        let cos_supported = hal.is_cos_supported();
        let mut multicast_gports = Vec::new();
        if cos_supported {
            for queue in 0..hal.num_cpu_queues(StreamType::Multicast) {
                multicast_gports.push(hal.resolve_gport(StreamType::Multicast, queue)?);
            }
            info!("CPU port has {} multicast queues", multicast_gports.len());
        } else {
            info!("platform has no cosq support, CPU queues disabled");
        }

        let configured = settings
            .iter()
            .map(|s| ((s.stream, s.id), s.clone()))
            .collect();

        Ok(Self {
            cos_supported,
            multicast_gports,
            configured,
        })
    }

    pub fn num_queues(&self, stream: StreamType) -> u8 {
        match stream {
            StreamType::Multicast => u8::try_from(self.multicast_gports.len()).unwrap_or(u8::MAX),
            _ => 0,
        }
    }

    /// Returns the gport of a CPU queue.
    pub fn queue_gport(&self, stream: StreamType, queue: u8) -> Result<Gport, CosqError> {
        if !self.cos_supported {
            return Err(CosqError::Unsupported {
                reason: "platform doesn't support cosq".to_string(),
            });
        }
        if stream != StreamType::Multicast {
            return Err(CosqError::Unsupported {
                reason: format!("unsupported stream type {}", stream),
            });
        }
        self.multicast_gports
            .get(usize::from(queue))
            .copied()
            .ok_or(CosqError::QueueNotFound { stream, queue })
    }

    /// Counters to export for each CPU queue.
    pub fn queue_counter_types(&self) -> &'static [QueueCounterType] {
        &CPU_QUEUE_COUNTER_TYPES
    }

    /// Settings in effect for one queue: configured, or the platform default.
    pub fn queue_settings(&self, stream: StreamType, queue: u8) -> QueueSettings {
        self.configured
            .get(&(stream, queue))
            .cloned()
            .unwrap_or_else(|| Self::default_queue_settings(stream, queue))
    }

    /// Settings of every CPU queue.
    pub fn current_queue_settings(&self) -> PortQueueConfig {
        let multicast = (0..self.num_queues(StreamType::Multicast))
            .map(|queue| self.queue_settings(StreamType::Multicast, queue))
            .collect();
        PortQueueConfig {
            unicast: Vec::new(),
            multicast,
        }
    }

    pub fn default_queue_settings(stream: StreamType, queue: u8) -> QueueSettings {
        QueueSettings::default_for(stream, queue)
    }
}
