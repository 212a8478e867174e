// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The RESP (REdis Serialization Protocol) wire format: reading one
//! top-level inbound frame from a buffered byte stream, and serializing
//! engine reply values back into RESP bytes.

pub mod frame;
pub mod reply;

pub use frame::Frame;
pub use reply::Reply;
