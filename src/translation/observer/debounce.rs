//! 合并短时间内的连续事件

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

struct DebounceInner<T> {
    buffer: RefCell<Vec<T>>,
    generation: Cell<u64>,
    delay: Duration,
    flush: Box<dyn Fn(Vec<T>)>,
}

impl<T> DebounceInner<T> {
    fn flush_now(&self) {
        let items = std::mem::take(&mut *self.buffer.borrow_mut());
        if !items.is_empty() {
            (self.flush)(items);
        }
    }
}

/// 防抖缓冲区
///
/// 每次 `push` 都重新计时，静默 `delay` 之后把累积的全部事件一次交给回调。
/// 计时器通过 `spawn_local` 运行，必须在 `LocalSet` 内使用。
pub struct Debouncer<T> {
    inner: Rc<DebounceInner<T>>,
}

impl<T: 'static> Debouncer<T> {
    pub fn new(delay: Duration, flush: impl Fn(Vec<T>) + 'static) -> Self {
        Self {
            inner: Rc::new(DebounceInner {
                buffer: RefCell::new(Vec::new()),
                generation: Cell::new(0),
                delay,
                flush: Box::new(flush),
            }),
        }
    }

    pub fn push(&self, item: T) {
        self.inner.buffer.borrow_mut().push(item);

        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);

        let inner = Rc::clone(&self.inner);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(inner.delay).await;
            // 期间有新事件则由更晚的计时器负责
            if inner.generation.get() == generation {
                inner.flush_now();
            }
        });
    }

    /// 立即交付缓冲区内容
    pub fn flush_now(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        self.inner.flush_now();
    }

    pub fn pending(&self) -> usize {
        self.inner.buffer.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_delivered_once() {
        LocalSet::new()
            .run_until(async {
                let batches: Rc<RefCell<Vec<Vec<u32>>>> = Rc::new(RefCell::new(Vec::new()));
                let sink = batches.clone();
                let debouncer = Debouncer::new(Duration::from_millis(150), move |items| {
                    sink.borrow_mut().push(items)
                });

                for i in 0..5 {
                    debouncer.push(i);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                assert!(batches.borrow().is_empty());

                tokio::time::sleep(Duration::from_millis(200)).await;
                assert_eq!(*batches.borrow(), vec![vec![0, 1, 2, 3, 4]]);
                assert_eq!(debouncer.pending(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now_cancels_timer() {
        LocalSet::new()
            .run_until(async {
                let count = Rc::new(Cell::new(0));
                let sink = count.clone();
                let debouncer = Debouncer::new(Duration::from_millis(150), move |items: Vec<u8>| {
                    sink.set(sink.get() + items.len())
                });

                debouncer.push(1);
                debouncer.flush_now();
                assert_eq!(count.get(), 1);

                tokio::time::sleep(Duration::from_millis(300)).await;
                assert_eq!(count.get(), 1);
            })
            .await;
    }
}
