//! TCP listener for tracker connections
//!
//! One task per connection. Frames are handed to the gateway in arrival
//! order; nothing is ever written back to the tracker.

use std::net::SocketAddr;

use h02own_core::Gateway;
use tokio::io::AsyncRead;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::frame::FrameReader;

/// Accept tracker connections until `shutdown` fires.
///
/// Accept failures are logged and the loop keeps going. Connection tasks are
/// handed a child token, so cancelling `shutdown` closes them as well.
pub async fn serve(listener: TcpListener, gateway: Gateway, shutdown: CancellationToken) {
    match listener.local_addr() {
        Ok(addr) => info!(%addr, "Listening for H02 trackers"),
        Err(e) => warn!(error = %e, "Listening for H02 trackers on unknown address"),
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Tracker listener shutting down");
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_stream(
                            stream,
                            peer,
                            gateway.clone(),
                            shutdown.child_token(),
                        ));
                    }
                    Err(e) => warn!(error = %e, "Failed to accept tracker connection"),
                }
            }
        }
    }
}

async fn handle_stream(
    stream: TcpStream,
    peer: SocketAddr,
    gateway: Gateway,
    shutdown: CancellationToken,
) {
    handle_connection(stream, peer, &gateway, &shutdown).await;
}

/// Feed every frame from one tracker connection through the gateway.
///
/// Returns when the peer disconnects, the stream fails, a frame exceeds the
/// size limit, or `shutdown` fires.
pub async fn handle_connection<R>(
    reader: R,
    peer: SocketAddr,
    gateway: &Gateway,
    shutdown: &CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    debug!(%peer, "TCP client connected");

    let mut frames = FrameReader::new(reader);
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = frames.next_frame() => next,
        };

        match next {
            Ok(Some(frame)) => {
                trace!(%peer, %frame, "TCP connection got new message");
                gateway.handle_frame(&frame).await;
            }
            Ok(None) => break,
            Err(e) => {
                warn!(%peer, error = %e, "Closing tracker connection");
                break;
            }
        }
    }

    debug!(%peer, "TCP client lost connection");
}
