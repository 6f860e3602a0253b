use crate::{
    codec::{JsonLinesCodec, JsonObject},
    error::Error,
    transport::{LogLine, Transport},
};
use futures::SinkExt;
use tokio::{io::AsyncWrite, sync::mpsc, task::JoinHandle};
use tokio_util::codec::FramedWrite;
use tracing::warn;

/// Fire-and-forget transport: `write` only enqueues, a tokio task owns the
/// destination and drains the queue in order.
#[derive(Clone, Debug)]
pub struct BackgroundTransport {
    tx: mpsc::UnboundedSender<JsonObject>,
}

impl BackgroundTransport {
    /// Spawns the writer task on the current runtime.
    ///
    /// The task ends once every clone of the transport has been dropped, flushing
    /// and handing the destination back through the join handle.
    pub fn spawn<W>(writer: W) -> (Self, JoinHandle<Result<W, Error>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonObject>();
        let handle = tokio::spawn(async move {
            let mut framed = FramedWrite::new(writer, JsonLinesCodec::new());
            while let Some(fields) = rx.recv().await {
                if let Err(e) = framed.send(fields).await {
                    warn!(error = %e, "Background log writer failed, line dropped");
                }
            }
            framed.close().await?;
            Ok(framed.into_inner())
        });
        (Self { tx }, handle)
    }
}

impl Transport for BackgroundTransport {
    fn name(&self) -> &'static str {
        "background"
    }

    fn write(&self, line: &LogLine) -> Result<(), Error> {
        self.tx
            .send(line.fields.clone())
            .map_err(|_| Error::WriterClosed)
    }
}
