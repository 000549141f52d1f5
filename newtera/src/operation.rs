/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Types for single object upload operation
pub mod put_object;

/// Types for single object download operation
pub mod get_object;

/// Types for downloading an object into a file
pub mod fget_object;

/// Types for the object information operation
pub mod stat_object;

/// Types for the object removal operation
pub mod remove_object;

/// Types for listing the objects of a bucket
pub mod list_objects;

pub(crate) mod bucket;
