// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Pending jobs and promises.
//!
//! Asynchronous work is cooperative: nothing runs until the embedder pumps
//! the queue with [`Realm::execute_pending_job`](crate::Realm::execute_pending_job),
//! one job at a time.

use crate::error::Exception;
use crate::realm::Realm;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce(&mut Realm) -> Result<(), Exception>>;

/// Outcome of running at most one pending job.
#[derive(Debug, Clone)]
pub enum JobStatus {
    /// A job ran to completion
    Ran,
    /// The queue was empty
    Idle,
    /// A job threw
    Failed(Exception),
}

/// FIFO queue of pending jobs.
#[derive(Default)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job.
    pub fn enqueue(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    /// Removes the oldest job.
    pub fn pop(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if no job is queued.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueue").field("len", &self.jobs.len()).finish()
    }
}

/// Settlement state of a promise.
#[derive(Debug, Clone)]
pub enum PromiseState {
    /// Not settled yet
    Pending,
    /// Resolved with a value
    Fulfilled(Value),
    /// Rejected with an exception
    Rejected(Exception),
}

/// A single-assignment completion cell shared between the realm and the embedder.
#[derive(Clone, Default)]
pub struct Promise(Rc<RefCell<Option<Result<Value, Exception>>>>);

impl Promise {
    /// A pending promise.
    pub fn pending() -> Self {
        Self::default()
    }

    /// An already rejected promise.
    pub fn rejected(exception: Exception) -> Self {
        let promise = Self::pending();
        promise.reject(exception);
        promise
    }

    /// Current state (cloned).
    pub fn state(&self) -> PromiseState {
        match &*self.0.borrow() {
            None => PromiseState::Pending,
            Some(Ok(value)) => PromiseState::Fulfilled(value.clone()),
            Some(Err(exception)) => PromiseState::Rejected(exception.clone()),
        }
    }

    /// Returns true until the promise settles.
    pub fn is_pending(&self) -> bool {
        self.0.borrow().is_none()
    }

    /// Fulfills the promise; a settled promise is left unchanged.
    pub fn fulfill(&self, value: Value) {
        self.settle(Ok(value));
    }

    /// Rejects the promise; a settled promise is left unchanged.
    pub fn reject(&self, exception: Exception) {
        self.settle(Err(exception));
    }

    fn settle(&self, result: Result<Value, Exception>) {
        let mut slot = self.0.borrow_mut();
        if slot.is_none() {
            *slot = Some(result);
        }
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Promise").field(&self.state()).finish()
    }
}
