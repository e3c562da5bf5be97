//! 命令通道
//!
//! 多生产者、单消费者的有界 FIFO 队列，连接任意数量的调用线程和唯一的工作线程。

use crate::command::DriverCommand;
use crate::error::DriverError;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::time::Duration;

/// 创建命令通道
///
/// # Example
///
/// ```
/// use amplink_driver::channel::command_channel;
/// use amplink_driver::DriverCommand;
/// use std::time::Duration;
///
/// let (tx, rx) = command_channel(4);
/// tx.enqueue(DriverCommand::StopPing).unwrap();
/// let frame = rx.dequeue(Duration::from_millis(10)).unwrap();
/// assert!(matches!(frame, Some(DriverCommand::StopPing)));
/// ```
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    (CommandSender { tx }, CommandReceiver { rx })
}

/// 命令发送端（可克隆，线程安全）
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<DriverCommand>,
}

impl CommandSender {
    /// 非阻塞入队
    ///
    /// # 错误
    /// - `DriverError::ChannelFull`: 队列已满
    /// - `DriverError::ChannelClosed`: 工作线程已退出
    pub fn enqueue(&self, command: DriverCommand) -> Result<(), DriverError> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => DriverError::ChannelFull,
            TrySendError::Disconnected(_) => DriverError::ChannelClosed,
        })
    }

    /// 阻塞入队（用于 `Quit`，保证关机请求不会因队列满而丢失）
    pub fn enqueue_blocking(&self, command: DriverCommand) -> Result<(), DriverError> {
        self.tx.send(command).map_err(|_| DriverError::ChannelClosed)
    }

    /// 当前排队的帧数
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// 命令接收端（工作线程独占）
#[derive(Debug)]
pub struct CommandReceiver {
    rx: Receiver<DriverCommand>,
}

impl CommandReceiver {
    /// 最多等待 `timeout` 取出下一帧
    ///
    /// - `Ok(Some(frame))`: 收到一帧
    /// - `Ok(None)`: 超时
    /// - `Err(DriverError::ChannelClosed)`: 所有发送端都已释放
    pub fn dequeue(&self, timeout: Duration) -> Result<Option<DriverCommand>, DriverError> {
        match self.rx.recv_timeout(timeout) {
            Ok(command) => Ok(Some(command)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(DriverError::ChannelClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const TICK: Duration = Duration::from_millis(20);

    #[test]
    fn test_dequeue_timeout() {
        let (_tx, rx) = command_channel(4);
        assert!(rx.dequeue(TICK).unwrap().is_none());
    }

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = command_channel(8);
        tx.enqueue(DriverCommand::volume_up(false)).unwrap();
        tx.enqueue(DriverCommand::volume_down(true)).unwrap();
        tx.enqueue(DriverCommand::StopPing).unwrap();
        tx.enqueue(DriverCommand::Quit).unwrap();
        assert_eq!(tx.len(), 4);

        let names: Vec<&str> = (0..4)
            .map(|_| rx.dequeue(TICK).unwrap().unwrap().name())
            .collect();
        assert_eq!(names, vec!["vol_up", "vol_down_prec", "stop_ping", "quit"]);
        assert!(tx.is_empty());
    }

    #[test]
    fn test_channel_full() {
        let (tx, _rx) = command_channel(2);
        tx.enqueue(DriverCommand::StopPing).unwrap();
        tx.enqueue(DriverCommand::StopPing).unwrap();
        assert!(matches!(
            tx.enqueue(DriverCommand::StopPing),
            Err(DriverError::ChannelFull)
        ));
    }

    #[test]
    fn test_channel_closed() {
        let (tx, rx) = command_channel(2);
        drop(rx);
        assert!(matches!(
            tx.enqueue(DriverCommand::StopPing),
            Err(DriverError::ChannelClosed)
        ));
        assert!(matches!(
            tx.enqueue_blocking(DriverCommand::Quit),
            Err(DriverError::ChannelClosed)
        ));

        let (tx, rx) = command_channel(2);
        drop(tx);
        assert!(matches!(rx.dequeue(TICK), Err(DriverError::ChannelClosed)));
    }

    #[test]
    fn test_multiple_producers_no_loss() {
        let (tx, rx) = command_channel(64);
        let producers: Vec<_> = (0..4)
            .map(|_| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        tx.enqueue_blocking(DriverCommand::volume_up(true)).unwrap();
                    }
                })
            })
            .collect();
        for handle in producers {
            handle.join().unwrap();
        }

        let mut received = 0;
        while let Some(_frame) = rx.dequeue(TICK).unwrap() {
            received += 1;
        }
        assert_eq!(received, 40);
    }
}
