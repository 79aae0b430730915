use rumqttc::{AsyncClient, ClientError, QoS};

/// The slice of an MQTT client the processors need.
pub trait MqttPublisher: Clone + Send + Sync + 'static {
    fn publish<S, V>(
        &self,
        topic: S,
        qos: QoS,
        retain: bool,
        payload: V,
    ) -> impl Future<Output = Result<(), ClientError>> + Send
    where
        S: Into<String> + Send,
        V: Into<Vec<u8>> + Send;
}

impl MqttPublisher for AsyncClient {
    async fn publish<S, V>(&self, topic: S, qos: QoS, retain: bool, payload: V) -> Result<(), ClientError>
    where
        S: Into<String> + Send,
        V: Into<Vec<u8>> + Send,
    {
        AsyncClient::publish(self, topic, qos, retain, payload).await
    }
}
