// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

mod concurrency;
mod delete;
mod media;
mod push;
mod scenarios;
mod scheduler;
