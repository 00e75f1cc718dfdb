/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

mod reporter_representations;
mod reporter_resources;
mod resource_with_references;
mod resources;
