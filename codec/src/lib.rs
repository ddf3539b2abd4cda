// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

pub mod blocks;
pub mod chain;
pub mod constants;
pub mod encoding;
pub mod errors;
pub mod jwk;
pub mod models;
pub mod pkcs12;
pub mod utils;
pub mod validation;
