// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;
use strand_core::{PendingRequest, RequestAbandoned, TickKey, TickRegistry};

const POLL: TickKey = TickKey("poll");

/// Registers a callback that polls `request` and stores its result.
fn poll_into(
    registry: &mut TickRegistry,
    mut request: PendingRequest<u32>,
    out: &Rc<RefCell<Option<Result<u32, RequestAbandoned>>>>,
) {
    let out = Rc::clone(out);
    registry.register(
        POLL,
        Box::new(move || match request.take_result() {
            Some(result) => {
                *out.borrow_mut() = Some(result);
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        }),
    );
}

#[test]
fn request_is_collected_on_the_tick_after_completion() {
    let mut registry = TickRegistry::new();
    let out = Rc::new(RefCell::new(None));
    let (completer, request) = PendingRequest::channel();
    poll_into(&mut registry, request, &out);

    registry.tick();
    registry.tick();
    assert_eq!(*out.borrow(), None);
    assert!(registry.is_registered(POLL));

    completer.complete(5);
    registry.tick();

    assert_eq!(*out.borrow(), Some(Ok(5)));
    assert!(!registry.is_registered(POLL));
}

#[test]
fn unregistering_releases_the_request() {
    let mut registry = TickRegistry::new();
    let out = Rc::new(RefCell::new(None));
    let (completer, request) = PendingRequest::channel();
    poll_into(&mut registry, request, &out);

    assert!(registry.unregister(POLL));

    // The request went with the callback; completing it is silently discarded.
    completer.complete(9);
    registry.tick();
    assert_eq!(*out.borrow(), None);
}

#[test]
fn abandoned_request_ends_the_callback() {
    let mut registry = TickRegistry::new();
    let out = Rc::new(RefCell::new(None));
    let (completer, request) = PendingRequest::<u32>::channel();
    poll_into(&mut registry, request, &out);

    drop(completer);
    registry.tick();

    assert_eq!(*out.borrow(), Some(Err(RequestAbandoned)));
    assert!(registry.is_empty());
}
