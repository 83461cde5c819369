//! Configuration change notification / 配置变更通知
//!
//! The notifier is owned by the settings context and handed to every
//! [`HostSettings`] it creates; nothing here is process-global.

use tokio::sync::broadcast;

use super::{registry, HostConfig, HostError, HostType};

const DEFAULT_CAPACITY: usize = 64;

/// Change event / 变更事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    HostConfigChanged { host_type: HostType, field: String },
}

/// Broadcast channel for configuration events / 配置事件通道
#[derive(Debug, Clone)]
pub struct ConfigNotifier {
    tx: broadcast::Sender<ConfigEvent>,
}

impl ConfigNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.tx.subscribe()
    }

    /// Publish an event; having no subscriber is not an error
    pub fn publish(&self, event: ConfigEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Config event dropped, no subscribers");
        }
    }
}

impl Default for ConfigNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// A host configuration being edited in a settings context / 可观察的图床配置
#[derive(Debug)]
pub struct HostSettings {
    host_type: HostType,
    config: HostConfig,
    notifier: ConfigNotifier,
    observing: bool,
}

impl HostSettings {
    /// Wrap a configuration; change notification starts detached
    pub fn new(host_type: HostType, config: HostConfig, notifier: ConfigNotifier) -> Self {
        Self {
            host_type,
            config,
            notifier,
            observing: false,
        }
    }

    /// Deserialize a persisted configuration and start observing it / 加载并开始监听
    pub fn load(host_type: HostType, text: &str, notifier: ConfigNotifier) -> Option<Self> {
        let config = registry::deserialize(host_type, text)?;
        let mut settings = Self::new(host_type, config, notifier);
        settings.attach_change_observer();
        Some(settings)
    }

    /// Idempotent / 重复调用无副作用
    pub fn attach_change_observer(&mut self) {
        if self.observing {
            return;
        }
        self.observing = true;
        tracing::debug!("Observing {} config fields", self.host_type);
    }

    /// Idempotent / 重复调用无副作用
    pub fn detach_change_observer(&mut self) {
        if !self.observing {
            return;
        }
        self.observing = false;
        tracing::debug!("Stopped observing {} config fields", self.host_type);
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Set a field from user input (value is trimmed) / 设置字段值
    ///
    /// Publishes exactly one [`ConfigEvent::HostConfigChanged`] while observing.
    pub fn set_field(&mut self, name: &str, value: Option<&str>) -> Result<(), HostError> {
        let value = value.map(|v| v.trim().to_string());
        self.config.set_field(name, value)?;
        tracing::debug!("Host config field changed: {}.{}", self.host_type, name);

        if self.observing {
            self.notifier.publish(ConfigEvent::HostConfigChanged {
                host_type: self.host_type,
                field: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn into_config(self) -> HostConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn s3_settings(notifier: &ConfigNotifier) -> HostSettings {
        let config = registry::create(HostType::AmazonS3).unwrap();
        HostSettings::new(HostType::AmazonS3, config, notifier.clone())
    }

    #[test]
    fn test_one_event_per_mutation() {
        let notifier = ConfigNotifier::new();
        let mut rx = notifier.subscribe();
        let mut settings = s3_settings(&notifier);
        settings.attach_change_observer();

        settings.set_field("bucket", Some(" shots ")).unwrap();
        settings.set_field("bucket", Some("shots")).unwrap();

        for _ in 0..2 {
            assert_eq!(
                rx.try_recv().unwrap(),
                ConfigEvent::HostConfigChanged {
                    host_type: HostType::AmazonS3,
                    field: "bucket".to_string()
                }
            );
        }
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(settings.config().field("bucket"), Some("shots"));
    }

    #[test]
    fn test_attach_and_detach_are_idempotent() {
        let notifier = ConfigNotifier::new();
        let mut rx = notifier.subscribe();
        let mut settings = s3_settings(&notifier);

        settings.attach_change_observer();
        settings.attach_change_observer();
        settings.set_field("region", Some("us-west-2")).unwrap();
        assert!(rx.try_recv().is_ok());
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        settings.detach_change_observer();
        settings.detach_change_observer();
        assert!(!settings.is_observing());
        settings.set_field("region", Some("eu-west-1")).unwrap();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(settings.config().field("region"), Some("eu-west-1"));
    }

    #[test]
    fn test_unknown_field_publishes_nothing() {
        let notifier = ConfigNotifier::new();
        let mut rx = notifier.subscribe();
        let mut settings = s3_settings(&notifier);
        settings.attach_change_observer();

        assert!(settings.set_field("token", Some("x")).is_err());
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_load_starts_observing() {
        let notifier = ConfigNotifier::new();
        let settings = HostSettings::load(HostType::Minio, r#"{"bucket":"b"}"#, notifier.clone()).unwrap();
        assert!(settings.is_observing());
        assert_eq!(settings.into_config().field("bucket"), Some("b"));

        assert!(HostSettings::load(HostType::Minio, "oops", notifier).is_none());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let notifier = ConfigNotifier::new();
        let mut settings = s3_settings(&notifier);
        settings.attach_change_observer();
        assert!(settings.set_field("folder", Some("x")).is_ok());
    }
}
