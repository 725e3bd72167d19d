//! Property-based tests for the blocking queue using proptest
//!
//! The single-threaded properties drive the queue against a `VecDeque`
//! model; the concurrent ones check delivery counts across threads.

use crate::queue::BoundedBlockingQueue;
use crate::{Error, PushError};
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
enum Op {
    Push(i32),
    Pop,
    Cancel,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => any::<i32>().prop_map(Op::Push),
        3 => Just(Op::Pop),
        1 => Just(Op::Cancel),
    ]
}

mod sequential_properties {
    use super::*;

    proptest! {
        #[test]
        fn test_fifo_ordering_single_thread(
            values in prop::collection::vec(any::<i32>(), 1..200)
        ) {
            let queue = BoundedBlockingQueue::new();
            for &value in &values {
                prop_assert!(queue.push(value).is_ok());
            }

            for &expected in &values {
                let (_, value) = queue.pop(false).unwrap();
                prop_assert_eq!(value, expected);
            }
            prop_assert!(queue.is_empty());
        }

        #[test]
        fn test_capacity_ceiling(
            capacity in 1usize..64,
            extra in 1usize..16
        ) {
            let queue = BoundedBlockingQueue::with_capacity(capacity);
            for i in 0..capacity {
                prop_assert_eq!(queue.push(i), Ok(i + 1));
            }
            for i in 0..extra {
                prop_assert_eq!(queue.push(capacity + i), Err(PushError::Full(capacity + i)));
                prop_assert_eq!(queue.len(), capacity);
            }
        }

        #[test]
        fn test_matches_model(
            capacity in 1usize..16,
            ops in prop::collection::vec(op_strategy(), 1..200)
        ) {
            let queue = BoundedBlockingQueue::with_capacity(capacity);
            let mut model: VecDeque<i32> = VecDeque::new();
            let mut cancelled = false;

            for op in ops {
                match op {
                    Op::Push(value) => {
                        let result = queue.push(value);
                        if cancelled {
                            prop_assert_eq!(result, Err(PushError::Cancelled(value)));
                        } else if model.len() == capacity {
                            prop_assert_eq!(result, Err(PushError::Full(value)));
                        } else {
                            model.push_back(value);
                            prop_assert_eq!(result, Ok(model.len()));
                        }
                    }
                    Op::Pop => {
                        let len = model.len();
                        let expected = match model.pop_front() {
                            Some(value) => Ok((len, value)),
                            None if cancelled => Err(Error::Cancelled),
                            None => Err(Error::Empty),
                        };
                        prop_assert_eq!(queue.pop(false), expected);
                    }
                    Op::Cancel => {
                        queue.cancel();
                        cancelled = true;
                    }
                }

                prop_assert!(queue.len() <= capacity);
                prop_assert_eq!(queue.len(), model.len());
                prop_assert_eq!(queue.is_cancelled(), cancelled);
            }
        }
    }
}

mod concurrent_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_blocking_consumers_receive_everything_once(
            num_producers in 1usize..4,
            num_consumers in 1usize..6,
            items_per_producer in 10usize..200,
            capacity in 1usize..32
        ) {
            let queue = Arc::new(BoundedBlockingQueue::<usize>::with_capacity(capacity));

            let consumers: Vec<_> = (0..num_consumers)
                .map(|_| {
                    let queue = Arc::clone(&queue);
                    thread::spawn(move || {
                        let mut received = Vec::new();
                        while let Ok((_, value)) = queue.pop(true) {
                            received.push(value);
                        }
                        received
                    })
                })
                .collect();

            let producers: Vec<_> = (0..num_producers)
                .map(|producer_id| {
                    let queue = Arc::clone(&queue);
                    thread::spawn(move || {
                        for i in 0..items_per_producer {
                            let mut value = producer_id * items_per_producer + i;
                            while let Err(err) = queue.push(value) {
                                value = err.into_inner();
                                thread::yield_now();
                            }
                        }
                    })
                })
                .collect();

            for handle in producers {
                handle.join().unwrap();
            }
            while !queue.is_empty() {
                thread::yield_now();
            }
            queue.cancel();

            let mut all_received = Vec::new();
            for handle in consumers {
                all_received.extend(handle.join().unwrap());
            }

            let expected_total = num_producers * items_per_producer;
            prop_assert_eq!(all_received.len(), expected_total);

            all_received.sort_unstable();
            all_received.dedup();
            prop_assert_eq!(all_received.len(), expected_total);
        }
    }
}
