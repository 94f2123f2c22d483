//! Bridges [Observable]s into the `futures` ecosystem: [ObservableStream]

use super::Observable;
use crate::{
    disposable::{Disposable, Subscription},
    observer::Observer,
};
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use futures::{
    Stream,
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
};


/// A `Stream` of the events of an [Observable]: items come as `Ok`, an error comes as a final `Err`
/// and completion ends the stream.\
/// Dropping it disposes the underlying subscription.
pub struct ObservableStream<T, E> {
    receiver:     UnboundedReceiver<Result<T, E>>,
    subscription: Subscription,
}

impl<T, E> ObservableStream<T, E> {
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl<T, E> Stream for ObservableStream<T, E> {
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

impl<T, E> Drop for ObservableStream<T, E> {
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}


/// Forwards events into the channel read by [ObservableStream]
struct ChannelObserver<T, E> {
    sender: UnboundedSender<Result<T, E>>,
}

impl<T: Send, E: Send> Observer<T, E> for ChannelObserver<T, E> {

    fn on_next(&self, item: T) {
        // a failure means the stream was dropped -- and the subscription disposed with it
        let _ = self.sender.unbounded_send(Ok(item));
    }

    fn on_error(&self, error: E) {
        let _ = self.sender.unbounded_send(Err(error));
        self.sender.close_channel();
    }

    fn on_completed(&self) {
        self.sender.close_channel();
    }
}

impl<T: Send + 'static, E: Send + 'static> Observable<T, E> {

    /// Subscribes, exposing the events as a `futures::Stream`.\
    /// Events are buffered without bounds until polled
    pub fn into_stream(self) -> ObservableStream<T, E> {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = self.subscribe(ChannelObserver { sender });
        ObservableStream { receiver, subscription }
    }
}


/// Unit tests the [stream](self) module
#[cfg(any(test,doc))]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[cfg_attr(not(doc),tokio::test)]
    async fn items_then_end() {
        let collected: Vec<Result<u32, String>> = Observable::from_iter(1..=3).into_stream().collect().await;
        assert_eq!(collected, vec![Ok(1), Ok(2), Ok(3)]);
    }

    #[cfg_attr(not(doc),tokio::test)]
    async fn errors_end_the_stream() {
        let observable = Observable::<u32, String>::create(|subscriber| {
            subscriber.on_next(1);
            subscriber.on_error("broken".to_string());
        });
        let collected: Vec<_> = observable.into_stream().collect().await;
        assert_eq!(collected, vec![Ok(1), Err("broken".to_string())]);
    }

    #[cfg_attr(not(doc),tokio::test)]
    async fn dropping_the_stream_disposes() {
        let stream = Observable::<u32, ()>::never().into_stream();
        let subscription = stream.subscription().clone();
        assert!(!subscription.is_disposed());
        drop(stream);
        assert!(subscription.is_disposed());
    }
}
